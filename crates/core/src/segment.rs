//! RFM scoring and CLV tier assignment. All cut-points are explicit, versioned
//! configuration; nothing here depends on BI-side bucketing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::CustomerClv;
use crate::domain::{CustomerId, OrderId};
use crate::fact::FactRow;
use crate::numeric::{rank_band_scores, round2};

/// Maps a minimum combined R+F+M score to a segment label. Rules are evaluated in
/// descending `min_score` order; the first match wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRule {
    pub min_score: u32,
    pub label: String,
}

/// Versioned classifier configuration. Defaults reproduce the reporting convention:
/// quartile scores 1..=4 per dimension and the five-segment threshold table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub version: u32,
    /// Fixed anchor for recency; "days since last order" is measured against this.
    pub analysis_date: NaiveDate,
    /// Number of rank-quantile bands per dimension (and CLV tiers).
    pub bands: u32,
    pub segment_rules: Vec<SegmentRule>,
    /// CLV tier labels from lowest to highest band. Length must equal `bands`.
    pub clv_tier_labels: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        let rules = [
            (10, "Champions"),
            (8, "Loyal Customers"),
            (6, "Potential Loyalists"),
            (4, "At Risk"),
            (0, "Lost Customers"),
        ];
        Self {
            version: 1,
            analysis_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or(NaiveDate::MAX),
            bands: 4,
            segment_rules: rules
                .into_iter()
                .map(|(min_score, label)| SegmentRule { min_score, label: label.to_string() })
                .collect(),
            clv_tier_labels: ["Bronze", "Silver", "Gold", "Platinum"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl SegmentationConfig {
    pub fn segment_label(&self, score: u32) -> String {
        let mut rules = self.segment_rules.clone();
        rules.sort_by(|a, b| b.min_score.cmp(&a.min_score));
        rules
            .iter()
            .find(|rule| score >= rule.min_score)
            .or(rules.last())
            .map(|rule| rule.label.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RfmRow {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub segment: String,
    pub recency_days: i64,
    pub frequency: u64,
    pub monetary: Decimal,
    pub r_score: u32,
    pub f_score: u32,
    pub m_score: u32,
    pub rfm_score: u32,
    pub rfm_segment: String,
}

struct RfmBase {
    customer_name: String,
    segment: String,
    last_order: NaiveDate,
    orders: std::collections::BTreeSet<OrderId>,
    monetary: Decimal,
}

/// Compute the RFM table, sorted by monetary value descending. Scores are rank-based
/// quantiles over the customer population; recency is inverted so that the most recent
/// buyers score highest.
pub fn rfm_table(facts: &[FactRow], config: &SegmentationConfig) -> Vec<RfmRow> {
    let mut base: BTreeMap<CustomerId, RfmBase> = BTreeMap::new();
    for row in facts {
        let entry = base.entry(row.customer_id.clone()).or_insert_with(|| RfmBase {
            customer_name: row.customer_name.clone(),
            segment: row.segment.clone(),
            last_order: row.order_date,
            orders: Default::default(),
            monetary: Decimal::ZERO,
        });
        entry.last_order = entry.last_order.max(row.order_date);
        entry.orders.insert(row.order_id.clone());
        entry.monetary += row.revenue;
    }

    // BTreeMap iteration gives a stable customer order, which pins the rank-band tie
    // breaks to customer id.
    let recencies: Vec<Decimal> = base
        .values()
        .map(|b| Decimal::from((config.analysis_date - b.last_order).num_days()))
        .collect();
    let frequencies: Vec<Decimal> =
        base.values().map(|b| Decimal::from(b.orders.len() as u64)).collect();
    let monetaries: Vec<Decimal> = base.values().map(|b| b.monetary).collect();

    let recency_bands = rank_band_scores(&recencies, config.bands);
    let f_scores = rank_band_scores(&frequencies, config.bands);
    let m_scores = rank_band_scores(&monetaries, config.bands);

    let mut rows: Vec<RfmRow> = base
        .into_iter()
        .enumerate()
        .map(|(i, (customer_id, b))| {
            // Lower recency is better: invert the ascending band.
            let r_score = config.bands + 1 - recency_bands[i];
            let rfm_score = r_score + f_scores[i] + m_scores[i];
            RfmRow {
                customer_id,
                customer_name: b.customer_name,
                segment: b.segment,
                recency_days: (config.analysis_date - b.last_order).num_days(),
                frequency: b.orders.len() as u64,
                monetary: round2(b.monetary),
                r_score,
                f_score: f_scores[i],
                m_score: m_scores[i],
                rfm_score,
                rfm_segment: config.segment_label(rfm_score),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.monetary.cmp(&a.monetary).then_with(|| a.customer_id.cmp(&b.customer_id)));
    rows
}

/// Assign CLV tiers in place from rank-based quantiles over `clv_estimate`. Tier
/// labels run lowest to highest band (Bronze through Platinum by default).
pub fn assign_clv_tiers(rows: &mut [CustomerClv], config: &SegmentationConfig) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| rows[a].customer_id.cmp(&rows[b].customer_id));

    let estimates: Vec<Decimal> = order.iter().map(|&i| rows[i].clv_estimate).collect();
    let bands = rank_band_scores(&estimates, config.bands);
    for (slot, &i) in order.iter().enumerate() {
        let label_index = (bands[slot] as usize - 1).min(config.clv_tier_labels.len().saturating_sub(1));
        rows[i].clv_tier =
            config.clv_tier_labels.get(label_index).cloned().unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::aggregate::CustomerClv;
    use crate::config::CleaningConfig;
    use crate::domain::{
        Customer, CustomerId, Dataset, Order, OrderId, OrderItem, Product, ProductId,
    };
    use crate::fact::build_fact_table;

    use super::{assign_clv_tiers, rfm_table, SegmentationConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    /// Four customers with strictly increasing recency, frequency, and monetary value:
    /// C-4 is the best on every dimension, C-1 the worst.
    fn dataset() -> Dataset {
        let mut orders = Vec::new();
        let mut items = Vec::new();
        let mut customers = Vec::new();
        for (n, customer) in ["C-1", "C-2", "C-3", "C-4"].into_iter().enumerate() {
            let n = n as u32 + 1;
            customers.push(Customer {
                id: CustomerId(customer.to_string()),
                name: format!("Customer {n}"),
                gender: "Female".to_string(),
                age: 30 + n,
                city: "Austin".to_string(),
                state: "Texas".to_string(),
                segment: "Consumer".to_string(),
            });
            for order_seq in 0..n {
                let id = format!("O-{customer}-{order_seq}");
                let ordered = date(2024, 6 + n, 1);
                orders.push(Order {
                    id: OrderId(id.clone()),
                    customer_id: CustomerId(customer.to_string()),
                    order_date: ordered,
                    ship_date: ordered,
                    ship_mode: "Standard Class".to_string(),
                    region: "South".to_string(),
                });
                items.push(OrderItem {
                    order_id: OrderId(id),
                    product_id: ProductId("P-1".to_string()),
                    quantity: n,
                    unit_price: Decimal::new(1000, 2),
                    discount: Decimal::ZERO,
                });
            }
        }
        Dataset {
            orders,
            customers,
            products: vec![Product {
                id: ProductId("P-1".to_string()),
                name: "Desk Lamp".to_string(),
                category: "Furniture".to_string(),
                sub_category: "Lighting".to_string(),
                brand: "Lumo".to_string(),
                cost_price: Decimal::new(500, 2),
            }],
            order_items: items,
            returns: vec![],
        }
    }

    #[test]
    fn rfm_scores_rank_each_dimension_into_bands() {
        let (facts, _) = build_fact_table(&dataset(), &CleaningConfig::default());
        let rows = rfm_table(&facts, &SegmentationConfig::default());
        assert_eq!(rows.len(), 4);

        let best = rows.iter().find(|r| r.customer_id.0 == "C-4").expect("C-4 present");
        assert_eq!((best.r_score, best.f_score, best.m_score), (4, 4, 4));
        assert_eq!(best.rfm_score, 12);
        assert_eq!(best.rfm_segment, "Champions");

        let worst = rows.iter().find(|r| r.customer_id.0 == "C-1").expect("C-1 present");
        assert_eq!((worst.r_score, worst.f_score, worst.m_score), (1, 1, 1));
        assert_eq!(worst.rfm_segment, "Lost Customers");
    }

    #[test]
    fn rfm_base_measures_match_the_fact_set() {
        let (facts, _) = build_fact_table(&dataset(), &CleaningConfig::default());
        let rows = rfm_table(&facts, &SegmentationConfig::default());
        let c2 = rows.iter().find(|r| r.customer_id.0 == "C-2").expect("C-2 present");
        assert_eq!(c2.frequency, 2);
        // Two orders of 2 units at 10.00 each.
        assert_eq!(c2.monetary, Decimal::new(4000, 2));
        assert_eq!(c2.recency_days, (date(2024, 12, 31) - date(2024, 8, 1)).num_days());
    }

    #[test]
    fn rfm_table_is_sorted_by_monetary_descending() {
        let (facts, _) = build_fact_table(&dataset(), &CleaningConfig::default());
        let rows = rfm_table(&facts, &SegmentationConfig::default());
        let ids: Vec<&str> = rows.iter().map(|r| r.customer_id.0.as_str()).collect();
        assert_eq!(ids, vec!["C-4", "C-3", "C-2", "C-1"]);
    }

    #[test]
    fn segment_labels_follow_the_threshold_table() {
        let config = SegmentationConfig::default();
        assert_eq!(config.segment_label(12), "Champions");
        assert_eq!(config.segment_label(10), "Champions");
        assert_eq!(config.segment_label(9), "Loyal Customers");
        assert_eq!(config.segment_label(7), "Potential Loyalists");
        assert_eq!(config.segment_label(5), "At Risk");
        assert_eq!(config.segment_label(3), "Lost Customers");
    }

    fn clv_row(id: &str, estimate_cents: i64) -> CustomerClv {
        CustomerClv {
            customer_id: CustomerId(id.to_string()),
            customer_name: format!("Customer {id}"),
            segment: "Consumer".to_string(),
            city: "Austin".to_string(),
            state: "Texas".to_string(),
            gender: "Female".to_string(),
            age: 40,
            total_orders: 1,
            total_revenue: Decimal::new(estimate_cents, 2),
            avg_order_value: Decimal::new(estimate_cents, 2),
            first_order_date: date(2024, 1, 1),
            last_order_date: date(2024, 1, 1),
            customer_lifespan_days: 0,
            clv_estimate: Decimal::new(estimate_cents, 2),
            clv_tier: String::new(),
        }
    }

    #[test]
    fn clv_tiers_are_quartiles_from_bronze_to_platinum() {
        let mut rows = vec![
            clv_row("C-1", 1000),
            clv_row("C-2", 2000),
            clv_row("C-3", 3000),
            clv_row("C-4", 4000),
        ];
        assign_clv_tiers(&mut rows, &SegmentationConfig::default());
        let tiers: Vec<&str> = rows.iter().map(|r| r.clv_tier.as_str()).collect();
        assert_eq!(tiers, vec!["Bronze", "Silver", "Gold", "Platinum"]);
    }
}
