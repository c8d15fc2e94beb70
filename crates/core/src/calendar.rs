//! Date dimension generation and period-comparison semantics (same period last year,
//! YoY growth, month/quarter/year-to-date running totals).

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fact::FactRow;
use crate::numeric::pct;

/// Inclusive calendar range. The date dimension covers every day of it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One row per calendar day. Every field is a pure function of `date`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateDimensionRow {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub quarter: String,
    pub month_year: String,
}

impl DateDimensionRow {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
            month_name: month_name(date),
            quarter: quarter_label(date),
            month_year: month_year(date),
        }
    }
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

pub fn quarter_label(date: NaiveDate) -> String {
    format!("Q{}", quarter_of(date))
}

pub fn month_name(date: NaiveDate) -> String {
    date.format("%B").to_string()
}

pub fn month_year(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Materialize the dimension for `range`, one row per day, ascending.
pub fn build_date_dimension(range: &CalendarRange) -> Vec<DateDimensionRow> {
    range
        .start
        .iter_days()
        .take_while(|day| *day <= range.end)
        .map(DateDimensionRow::for_date)
        .collect()
}

/// Shift a date back exactly one calendar year. Feb 29 clamps to Feb 28 when the
/// prior year is not a leap year.
pub fn shift_back_one_year(date: NaiveDate) -> NaiveDate {
    let prior_year = date.year() - 1;
    match NaiveDate::from_ymd_opt(prior_year, date.month(), date.day()) {
        Some(shifted) => shifted,
        None => NaiveDate::from_ymd_opt(prior_year, 2, 28).unwrap_or(date),
    }
}

/// "Same period last year" for a reporting range: both endpoints shifted back one year.
pub fn same_period_last_year(range: &CalendarRange) -> CalendarRange {
    CalendarRange {
        start: shift_back_one_year(range.start),
        end: shift_back_one_year(range.end),
    }
}

/// Year-over-year growth percentage. A zero prior yields 0, never an error.
pub fn yoy_growth_pct(current: Decimal, prior: Decimal) -> Decimal {
    pct(current - prior, prior)
}

/// Grain for running totals: cumulative from the period start through the as-of date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGrain {
    MonthToDate,
    QuarterToDate,
    YearToDate,
}

/// First day of the month/quarter/year containing `date`.
pub fn period_start(date: NaiveDate, grain: PeriodGrain) -> NaiveDate {
    let (year, month) = match grain {
        PeriodGrain::MonthToDate => (date.year(), date.month()),
        PeriodGrain::QuarterToDate => (date.year(), (quarter_of(date) - 1) * 3 + 1),
        PeriodGrain::YearToDate => (date.year(), 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Cumulative sum of `measure` over fact rows whose order date falls inside
/// `[period_start(as_of, grain), as_of]`, inclusive on both ends.
pub fn running_total<F>(facts: &[FactRow], as_of: NaiveDate, grain: PeriodGrain, measure: F) -> Decimal
where
    F: Fn(&FactRow) -> Decimal,
{
    let start = period_start(as_of, grain);
    facts
        .iter()
        .filter(|row| row.order_date >= start && row.order_date <= as_of)
        .map(measure)
        .sum()
}
