//! One extraction run: validate inputs, build the fact table, then derive every
//! aggregate table from it. Pure; the same dataset and config always produce the same
//! output.

use crate::aggregate::{
    category_share, customer_clv, product_performance, regional_performance, CategoryShare,
    CustomerClv, ProductPerformance, RegionalPerformance,
};
use crate::config::EngineConfig;
use crate::domain::Dataset;
use crate::errors::EngineError;
use crate::fact::{build_fact_table, FactBuildReport, FactRow};
use crate::segment::{assign_clv_tiers, rfm_table, RfmRow};

/// Every table of one run, plus the row-level build report.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOutput {
    pub sales_fact: Vec<FactRow>,
    pub customer_clv: Vec<CustomerClv>,
    pub rfm_segmentation: Vec<RfmRow>,
    pub product_performance: Vec<ProductPerformance>,
    pub regional_performance: Vec<RegionalPerformance>,
    pub category_share: Vec<CategoryShare>,
    pub report: FactBuildReport,
}

/// Compute all derived tables. Fails only when a required input table is empty;
/// row-level problems are skipped or flagged in the report.
pub fn compute_tables(dataset: &Dataset, config: &EngineConfig) -> Result<EngineOutput, EngineError> {
    require_nonempty("orders", dataset.orders.len())?;
    require_nonempty("customers", dataset.customers.len())?;
    require_nonempty("products", dataset.products.len())?;
    require_nonempty("order_items", dataset.order_items.len())?;

    let (sales_fact, report) = build_fact_table(dataset, &config.cleaning);
    tracing::info!(
        rows = report.rows_emitted,
        skipped = report.rows_skipped(),
        duplicates = report.duplicates_removed,
        "fact table built"
    );

    let mut clv = customer_clv(&sales_fact);
    assign_clv_tiers(&mut clv, &config.segmentation);

    let output = EngineOutput {
        rfm_segmentation: rfm_table(&sales_fact, &config.segmentation),
        product_performance: product_performance(&sales_fact),
        regional_performance: regional_performance(&sales_fact),
        category_share: category_share(&sales_fact),
        customer_clv: clv,
        sales_fact,
        report,
    };
    tracing::info!(
        customers = output.customer_clv.len(),
        products = output.product_performance.len(),
        regions = output.regional_performance.len(),
        "aggregate tables computed"
    );
    Ok(output)
}

fn require_nonempty(table: &'static str, len: usize) -> Result<(), EngineError> {
    if len == 0 {
        return Err(EngineError::EmptyTable(table));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::calendar::{running_total, PeriodGrain};
    use crate::config::EngineConfig;
    use crate::domain::{
        Customer, CustomerId, Dataset, Order, OrderId, OrderItem, Product, ProductId,
    };
    use crate::errors::EngineError;

    use super::compute_tables;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn dataset() -> Dataset {
        let order = |id: &str, ordered: NaiveDate| Order {
            id: OrderId(id.to_string()),
            customer_id: CustomerId("C-1".to_string()),
            order_date: ordered,
            ship_date: ordered + chrono::Days::new(3),
            ship_mode: "Standard Class".to_string(),
            region: "South".to_string(),
        };
        let item = |id: &str, quantity: u32| OrderItem {
            order_id: OrderId(id.to_string()),
            product_id: ProductId("P-1".to_string()),
            quantity,
            unit_price: Decimal::new(1000, 2),
            discount: Decimal::ZERO,
        };
        Dataset {
            orders: vec![
                order("O-1", date(2023, 8, 2)),
                order("O-2", date(2023, 8, 10)),
                order("O-3", date(2023, 7, 20)),
            ],
            customers: vec![Customer {
                id: CustomerId("C-1".to_string()),
                name: "Asha Rao".to_string(),
                gender: "Female".to_string(),
                age: 34,
                city: "Austin".to_string(),
                state: "Texas".to_string(),
                segment: "Consumer".to_string(),
            }],
            products: vec![Product {
                id: ProductId("P-1".to_string()),
                name: "Desk Lamp".to_string(),
                category: "Furniture".to_string(),
                sub_category: "Lighting".to_string(),
                brand: "Lumo".to_string(),
                cost_price: Decimal::new(500, 2),
            }],
            order_items: vec![item("O-1", 1), item("O-2", 2), item("O-3", 4)],
            returns: vec![],
        }
    }

    #[test]
    fn empty_required_table_fails_the_run() {
        let mut data = dataset();
        data.order_items.clear();
        let result = compute_tables(&data, &EngineConfig::default());
        assert_eq!(result.unwrap_err(), EngineError::EmptyTable("order_items"));
    }

    #[test]
    fn missing_returns_table_is_fine() {
        let output =
            compute_tables(&dataset(), &EngineConfig::default()).expect("returns are optional");
        assert_eq!(output.sales_fact.len(), 3);
        assert!(output.sales_fact.iter().all(|row| !row.is_returned));
    }

    #[test]
    fn output_tables_are_consistent_with_each_other() {
        let output = compute_tables(&dataset(), &EngineConfig::default()).expect("valid run");
        assert_eq!(output.customer_clv.len(), 1);
        assert_eq!(output.rfm_segmentation.len(), 1);
        let fact_revenue: Decimal = output.sales_fact.iter().map(|r| r.revenue).sum();
        assert_eq!(output.customer_clv[0].total_revenue, fact_revenue);
        assert_eq!(output.rfm_segmentation[0].monetary, fact_revenue);
        assert_eq!(output.category_share[0].revenue_share_pct, Decimal::ONE_HUNDRED);
        assert!(!output.customer_clv[0].clv_tier.is_empty());
    }

    #[test]
    fn recomputing_the_same_dataset_is_idempotent() {
        let data = dataset();
        let config = EngineConfig::default();
        let first = compute_tables(&data, &config).expect("first run");
        let second = compute_tables(&data, &config).expect("second run");
        assert_eq!(first, second);
    }

    #[test]
    fn running_totals_cover_period_start_through_as_of() {
        let output = compute_tables(&dataset(), &EngineConfig::default()).expect("valid run");
        let as_of = date(2023, 8, 10);
        // MTD: O-1 (10.00) + O-2 (20.00); O-3 is July.
        let mtd = running_total(&output.sales_fact, as_of, PeriodGrain::MonthToDate, |r| r.revenue);
        assert_eq!(mtd, Decimal::new(3000, 2));
        // QTD picks up O-3 as well.
        let qtd = running_total(&output.sales_fact, as_of, PeriodGrain::QuarterToDate, |r| r.revenue);
        assert_eq!(qtd, Decimal::new(7000, 2));
        let ytd = running_total(&output.sales_fact, as_of, PeriodGrain::YearToDate, |r| r.revenue);
        assert_eq!(ytd, qtd);
    }
}
