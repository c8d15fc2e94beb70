use rust_decimal::Decimal;
use thiserror::Error;

/// A dangling foreign key. The offending row is skipped, counted, and logged; it is
/// never fatal for the run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntegrityViolation {
    #[error("order item references missing order `{order_id}`")]
    MissingOrder { order_id: String },
    #[error("order item for order `{order_id}` references missing product `{product_id}`")]
    MissingProduct { order_id: String, product_id: String },
    #[error("order `{order_id}` references missing customer `{customer_id}`")]
    MissingCustomer { order_id: String, customer_id: String },
    #[error("return references missing order `{order_id}`")]
    DanglingReturn { order_id: String },
}

/// A suspect value in an otherwise joinable row. Ship-before-order rows are kept and
/// flagged; rows that would produce negative revenue are skipped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QualityIssue {
    #[error("order `{order_id}` ships {days} day(s) before it was placed")]
    ShipBeforeOrder { order_id: String, days: i64 },
    #[error("order item `{order_id}`/`{product_id}` has a negative unit price")]
    NegativeUnitPrice { order_id: String, product_id: String },
    #[error("order item `{order_id}`/`{product_id}` has discount {discount} outside [0, 1]")]
    DiscountOutOfRange { order_id: String, product_id: String, discount: Decimal },
    #[error("order item `{order_id}`/`{product_id}` has zero quantity")]
    ZeroQuantity { order_id: String, product_id: String },
}

/// Run-level failures. Row-level problems never surface here; a run only fails when a
/// required input table is absent entirely.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("required input table `{0}` is empty")]
    EmptyTable(&'static str),
}
