//! Grouped aggregate tables over the fact set: customer CLV, product performance,
//! regional performance, and category revenue share. Every ratio goes through
//! safe-divide; a zero denominator yields 0, never an error or NaN.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CustomerId, OrderId, ProductId};
use crate::fact::FactRow;
use crate::numeric::{pct, round2, safe_div};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerClv {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub segment: String,
    pub city: String,
    pub state: String,
    pub gender: String,
    pub age: u32,
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub avg_order_value: Decimal,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
    pub customer_lifespan_days: i64,
    pub clv_estimate: Decimal,
    /// Filled in by the segmentation classifier after aggregation.
    pub clv_tier: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub sub_category: String,
    pub brand: String,
    pub total_units_sold: u64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub profit_margin_pct: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionalPerformance {
    pub region: String,
    pub state: String,
    pub total_orders: u64,
    pub total_units: u64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub avg_order_value: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub total_revenue: Decimal,
    pub revenue_share_pct: Decimal,
}

#[derive(Default)]
struct Accumulator {
    order_ids: BTreeSet<OrderId>,
    units: u64,
    revenue: Decimal,
    profit: Decimal,
    line_count: u64,
    first_order: Option<NaiveDate>,
    last_order: Option<NaiveDate>,
}

impl Accumulator {
    fn absorb(&mut self, row: &FactRow) {
        self.order_ids.insert(row.order_id.clone());
        self.units += u64::from(row.quantity);
        self.revenue += row.revenue;
        self.profit += row.profit;
        self.line_count += 1;
        self.first_order =
            Some(self.first_order.map_or(row.order_date, |d| d.min(row.order_date)));
        self.last_order = Some(self.last_order.map_or(row.order_date, |d| d.max(row.order_date)));
    }

    fn total_orders(&self) -> u64 {
        self.order_ids.len() as u64
    }
}

fn group_by<K: Ord, F: Fn(&FactRow) -> K>(facts: &[FactRow], key: F) -> BTreeMap<K, Accumulator> {
    let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
    for row in facts {
        groups.entry(key(row)).or_default().absorb(row);
    }
    groups
}

/// First fact row seen per key; attribute columns are uniform within a group because
/// the input model holds one record per customer/product.
fn samples_by<'a, K: Ord, F: Fn(&FactRow) -> K>(
    facts: &'a [FactRow],
    key: F,
) -> BTreeMap<K, &'a FactRow> {
    let mut samples: BTreeMap<K, &FactRow> = BTreeMap::new();
    for row in facts {
        samples.entry(key(row)).or_insert(row);
    }
    samples
}

/// Per-customer lifetime value table, sorted by `clv_estimate` descending. Customers
/// with no surviving fact rows never appear; the join excludes them.
pub fn customer_clv(facts: &[FactRow]) -> Vec<CustomerClv> {
    let samples = samples_by(facts, |row| row.customer_id.clone());
    let groups = group_by(facts, |row| row.customer_id.clone());
    let mut rows: Vec<CustomerClv> = groups
        .into_iter()
        .filter_map(|(customer_id, acc)| {
            let sample = *samples.get(&customer_id)?;
            let first = acc.first_order.unwrap_or(sample.order_date);
            let last = acc.last_order.unwrap_or(sample.order_date);
            Some(CustomerClv {
                customer_id,
                customer_name: sample.customer_name.clone(),
                segment: sample.segment.clone(),
                city: sample.city.clone(),
                state: sample.state.clone(),
                gender: sample.gender.clone(),
                age: sample.age,
                total_orders: acc.total_orders(),
                total_revenue: round2(acc.revenue),
                avg_order_value: round2(safe_div(acc.revenue, Decimal::from(acc.line_count))),
                first_order_date: first,
                last_order_date: last,
                customer_lifespan_days: (last - first).num_days(),
                clv_estimate: round2(safe_div(acc.revenue, Decimal::from(acc.total_orders()))),
                clv_tier: String::new(),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.clv_estimate.cmp(&a.clv_estimate).then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    rows
}

/// Per-product totals, sorted by revenue descending. Margin is profit over revenue.
pub fn product_performance(facts: &[FactRow]) -> Vec<ProductPerformance> {
    let samples = samples_by(facts, |row| row.product_id.clone());
    let groups = group_by(facts, |row| row.product_id.clone());
    let mut rows: Vec<ProductPerformance> = groups
        .into_iter()
        .filter_map(|(product_id, acc)| {
            let sample = *samples.get(&product_id)?;
            Some(ProductPerformance {
                product_id,
                product_name: sample.product_name.clone(),
                category: sample.category.clone(),
                sub_category: sample.sub_category.clone(),
                brand: sample.brand.clone(),
                total_units_sold: acc.units,
                total_revenue: round2(acc.revenue),
                total_profit: round2(acc.profit),
                profit_margin_pct: pct(acc.profit, acc.revenue),
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_revenue.cmp(&a.total_revenue).then_with(|| a.product_id.cmp(&b.product_id))
    });
    rows
}

/// Per-(region, state) totals, sorted by the grouping key.
pub fn regional_performance(facts: &[FactRow]) -> Vec<RegionalPerformance> {
    let groups = group_by(facts, |row| (row.region.clone(), row.state.clone()));
    groups
        .into_iter()
        .map(|((region, state), acc)| RegionalPerformance {
            region,
            state,
            total_orders: acc.total_orders(),
            total_units: acc.units,
            total_revenue: round2(acc.revenue),
            total_profit: round2(acc.profit),
            avg_order_value: round2(safe_div(acc.revenue, Decimal::from(acc.total_orders()))),
        })
        .collect()
}

/// Revenue share per category against the grand total of the full fact set, sorted by
/// revenue descending.
pub fn category_share(facts: &[FactRow]) -> Vec<CategoryShare> {
    let grand_total: Decimal = facts.iter().map(|row| row.revenue).sum();
    let groups = group_by(facts, |row| row.category.clone());
    let mut rows: Vec<CategoryShare> = groups
        .into_iter()
        .map(|(category, acc)| CategoryShare {
            category,
            total_revenue: round2(acc.revenue),
            revenue_share_pct: pct(acc.revenue, grand_total),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_revenue.cmp(&a.total_revenue).then_with(|| a.category.cmp(&b.category))
    });
    rows
}
