//! End-of-run summary over the computed tables, rendered by the CLI.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::CustomerClv;
use crate::fact::FactRow;
use crate::numeric::{pct, round2, safe_div};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub first_order_date: Option<NaiveDate>,
    pub last_order_date: Option<NaiveDate>,
    pub total_orders: u64,
    pub total_customers: u64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
    pub avg_profit_margin_pct: Decimal,
    pub top_clv_estimate: Decimal,
    pub return_rate_pct: Decimal,
    pub categories: Vec<String>,
}

pub fn summarize(facts: &[FactRow], clv: &[CustomerClv]) -> Summary {
    let order_ids: BTreeSet<&str> = facts.iter().map(|row| row.order_id.0.as_str()).collect();
    let customer_ids: BTreeSet<&str> =
        facts.iter().map(|row| row.customer_id.0.as_str()).collect();
    let categories: BTreeSet<&str> = facts.iter().map(|row| row.category.as_str()).collect();

    let margin_sum: Decimal = facts.iter().map(|row| row.profit_margin_pct).sum();
    let returned = facts.iter().filter(|row| row.is_returned).count();

    Summary {
        first_order_date: facts.iter().map(|row| row.order_date).min(),
        last_order_date: facts.iter().map(|row| row.order_date).max(),
        total_orders: order_ids.len() as u64,
        total_customers: customer_ids.len() as u64,
        total_revenue: round2(facts.iter().map(|row| row.revenue).sum()),
        total_profit: round2(facts.iter().map(|row| row.profit).sum()),
        avg_profit_margin_pct: round2(safe_div(margin_sum, Decimal::from(facts.len() as u64))),
        top_clv_estimate: clv.iter().map(|row| row.clv_estimate).max().unwrap_or(Decimal::ZERO),
        return_rate_pct: pct(Decimal::from(returned as u64), Decimal::from(facts.len() as u64)),
        categories: categories.into_iter().map(str::to_string).collect(),
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let range = match (self.first_order_date, self.last_order_date) {
            (Some(first), Some(last)) => format!("{first} to {last}"),
            _ => "no fact rows".to_string(),
        };
        writeln!(f, "Date range        : {range}")?;
        writeln!(f, "Total orders      : {}", self.total_orders)?;
        writeln!(f, "Total customers   : {}", self.total_customers)?;
        writeln!(f, "Total revenue     : {:.2}", self.total_revenue)?;
        writeln!(f, "Total profit      : {:.2}", self.total_profit)?;
        writeln!(f, "Avg profit margin : {:.2}%", self.avg_profit_margin_pct)?;
        writeln!(f, "Top customer CLV  : {:.2}", self.top_clv_estimate)?;
        writeln!(f, "Return rate       : {:.2}%", self.return_rate_pct)?;
        write!(f, "Categories        : {}", self.categories.join(", "))
    }
}
