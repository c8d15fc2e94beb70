pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod fact;
pub mod numeric;
pub mod report;
pub mod segment;

pub use aggregate::{
    category_share, customer_clv, product_performance, regional_performance, CategoryShare,
    CustomerClv, ProductPerformance, RegionalPerformance,
};
pub use calendar::{
    build_date_dimension, same_period_last_year, shift_back_one_year, yoy_growth_pct,
    CalendarRange, DateDimensionRow, PeriodGrain,
};
pub use config::{CleaningConfig, ConfigError, EngineConfig, LoadOptions, LogFormat, LoggingConfig};
pub use domain::{Customer, CustomerId, Dataset, Order, OrderId, OrderItem, Product, ProductId, Return};
pub use engine::{compute_tables, EngineOutput};
pub use errors::{EngineError, IntegrityViolation, QualityIssue};
pub use fact::{build_fact_table, FactBuildReport, FactRow, OrderStatus};
pub use numeric::{pct, round2, safe_div};
pub use report::{summarize, Summary};
pub use segment::{assign_clv_tiers, rfm_table, RfmRow, SegmentRule, SegmentationConfig};
