//! Fact table construction: join orders, customers, products, items, and returns into
//! one flattened row per order item, with all derived money fields computed here so the
//! aggregation layer never re-derives them.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{month_name, month_year, quarter_of};
use crate::config::CleaningConfig;
use crate::domain::{CustomerId, Dataset, OrderId, ProductId};
use crate::errors::{IntegrityViolation, QualityIssue};
use crate::numeric::{pct, percentile, round1, round2};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Completed,
    Returned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order item, fully joined and derived. Read-only projection; rebuilt per run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactRow {
    pub order_id: OrderId,
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub ship_mode: String,
    pub region: String,
    pub order_year: i32,
    pub order_month: u32,
    pub month_name: String,
    pub order_quarter: u32,
    pub month_year: String,
    pub shipping_days: i64,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub gender: String,
    pub age: u32,
    pub age_group: String,
    pub city: String,
    pub state: String,
    pub segment: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub sub_category: String,
    pub brand: String,
    pub cost_price: Decimal,
    pub quantity: u32,
    pub selling_price: Decimal,
    pub discount: Decimal,
    pub discount_pct: Decimal,
    pub net_price: Decimal,
    pub revenue: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub profit_margin_pct: Decimal,
    pub order_status: OrderStatus,
    pub is_returned: bool,
}

/// What happened during one fact build: emitted rows, dropped duplicates, skipped rows
/// with dangling references, and rows flagged but kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FactBuildReport {
    pub rows_emitted: usize,
    pub duplicates_removed: usize,
    pub integrity_violations: Vec<IntegrityViolation>,
    pub quality_issues: Vec<QualityIssue>,
    pub margin_cap: Option<Decimal>,
}

impl FactBuildReport {
    pub fn rows_skipped(&self) -> usize {
        self.integrity_violations.len()
            + self
                .quality_issues
                .iter()
                .filter(|issue| {
                    matches!(
                        issue,
                        QualityIssue::NegativeUnitPrice { .. }
                            | QualityIssue::ZeroQuantity { .. }
                            | QualityIssue::DiscountOutOfRange { .. }
                    )
                })
                .count()
    }
}

/// Build the flattened fact table. Rows with dangling foreign keys are skipped and
/// logged; ship-before-order rows are kept and flagged. Output is sorted by
/// `(order_date, order_id, product_id)` and exact duplicates are dropped, so reruns on
/// identical input are byte-identical downstream.
pub fn build_fact_table(dataset: &Dataset, cleaning: &CleaningConfig) -> (Vec<FactRow>, FactBuildReport) {
    let orders: HashMap<&OrderId, &crate::domain::Order> =
        dataset.orders.iter().map(|o| (&o.id, o)).collect();
    let products: HashMap<&ProductId, &crate::domain::Product> =
        dataset.products.iter().map(|p| (&p.id, p)).collect();
    let customers: HashMap<&CustomerId, &crate::domain::Customer> =
        dataset.customers.iter().map(|c| (&c.id, c)).collect();

    let mut report = FactBuildReport::default();

    let mut returned: HashSet<&OrderId> = HashSet::new();
    for ret in &dataset.returns {
        if orders.contains_key(&ret.order_id) {
            returned.insert(&ret.order_id);
        } else {
            let violation =
                IntegrityViolation::DanglingReturn { order_id: ret.order_id.0.clone() };
            tracing::warn!(order_id = %ret.order_id.0, "skipping return: {violation}");
            report.integrity_violations.push(violation);
        }
    }

    let mut rows = Vec::with_capacity(dataset.order_items.len());
    for item in &dataset.order_items {
        let Some(order) = orders.get(&item.order_id) else {
            skip(&mut report, IntegrityViolation::MissingOrder { order_id: item.order_id.0.clone() });
            continue;
        };
        let Some(product) = products.get(&item.product_id) else {
            skip(
                &mut report,
                IntegrityViolation::MissingProduct {
                    order_id: item.order_id.0.clone(),
                    product_id: item.product_id.0.clone(),
                },
            );
            continue;
        };
        let Some(customer) = customers.get(&order.customer_id) else {
            skip(
                &mut report,
                IntegrityViolation::MissingCustomer {
                    order_id: order.id.0.clone(),
                    customer_id: order.customer_id.0.clone(),
                },
            );
            continue;
        };

        if item.quantity == 0 {
            let issue = QualityIssue::ZeroQuantity {
                order_id: item.order_id.0.clone(),
                product_id: item.product_id.0.clone(),
            };
            tracing::warn!(order_id = %item.order_id.0, "skipping row: {issue}");
            report.quality_issues.push(issue);
            continue;
        }
        if item.unit_price < Decimal::ZERO {
            let issue = QualityIssue::NegativeUnitPrice {
                order_id: item.order_id.0.clone(),
                product_id: item.product_id.0.clone(),
            };
            tracing::warn!(order_id = %item.order_id.0, "skipping row: {issue}");
            report.quality_issues.push(issue);
            continue;
        }
        if item.discount < Decimal::ZERO || item.discount > Decimal::ONE {
            let issue = QualityIssue::DiscountOutOfRange {
                order_id: item.order_id.0.clone(),
                product_id: item.product_id.0.clone(),
                discount: item.discount,
            };
            tracing::warn!(order_id = %item.order_id.0, "skipping row: {issue}");
            report.quality_issues.push(issue);
            continue;
        }

        let shipping_days = (order.ship_date - order.order_date).num_days();
        if shipping_days < 0 {
            let issue = QualityIssue::ShipBeforeOrder {
                order_id: order.id.0.clone(),
                days: -shipping_days,
            };
            tracing::warn!(order_id = %order.id.0, "flagging row: {issue}");
            report.quality_issues.push(issue);
        }

        let quantity = Decimal::from(item.quantity);
        let net_price = round2(item.unit_price * (Decimal::ONE - item.discount));
        let revenue = round2(quantity * net_price);
        let total_cost = round2(quantity * product.cost_price);
        let profit = revenue - total_cost;
        let profit_margin_pct = pct(net_price - product.cost_price, product.cost_price);

        let status =
            if returned.contains(&order.id) { OrderStatus::Returned } else { OrderStatus::Completed };

        rows.push(FactRow {
            order_id: order.id.clone(),
            order_date: order.order_date,
            ship_date: order.ship_date,
            ship_mode: normalize(&order.ship_mode, cleaning),
            region: normalize(&order.region, cleaning),
            order_year: order.order_date.year(),
            order_month: order.order_date.month(),
            month_name: month_name(order.order_date),
            order_quarter: quarter_of(order.order_date),
            month_year: month_year(order.order_date),
            shipping_days,
            customer_id: customer.id.clone(),
            customer_name: customer.name.trim().to_string(),
            gender: normalize(&customer.gender, cleaning),
            age: customer.age,
            age_group: customer.age_group().to_string(),
            city: customer.city.trim().to_string(),
            state: customer.state.trim().to_string(),
            segment: normalize(&customer.segment, cleaning),
            product_id: product.id.clone(),
            product_name: product.name.trim().to_string(),
            category: normalize(&product.category, cleaning),
            sub_category: normalize(&product.sub_category, cleaning),
            brand: product.brand.trim().to_string(),
            cost_price: product.cost_price,
            quantity: item.quantity,
            selling_price: item.unit_price,
            discount: item.discount,
            discount_pct: round1(item.discount * Decimal::ONE_HUNDRED),
            net_price,
            revenue,
            total_cost,
            profit,
            profit_margin_pct,
            order_status: status,
            is_returned: status == OrderStatus::Returned,
        });
    }

    rows.sort_by(|a, b| {
        (a.order_date, &a.order_id.0, &a.product_id.0, a.quantity, a.selling_price, a.discount).cmp(
            &(b.order_date, &b.order_id.0, &b.product_id.0, b.quantity, b.selling_price, b.discount),
        )
    });
    let before = rows.len();
    rows.dedup();
    report.duplicates_removed = before - rows.len();

    if let Some(p) = cleaning.margin_cap_percentile {
        let margins: Vec<Decimal> = rows.iter().map(|r| r.profit_margin_pct).collect();
        if let Some(cap) = percentile(&margins, p) {
            for row in &mut rows {
                if row.profit_margin_pct > cap {
                    row.profit_margin_pct = cap;
                }
            }
            report.margin_cap = Some(cap);
        }
    }

    report.rows_emitted = rows.len();
    (rows, report)
}

fn skip(report: &mut FactBuildReport, violation: IntegrityViolation) {
    tracing::warn!("skipping order item: {violation}");
    report.integrity_violations.push(violation);
}

fn normalize(value: &str, cleaning: &CleaningConfig) -> String {
    if cleaning.normalize_text {
        title_case(value)
    } else {
        value.trim().to_string()
    }
}

/// Trim and title-case a label column ("first class" -> "First Class").
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
