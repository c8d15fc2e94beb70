//! Table export. Column order and number formatting are part of the engine contract:
//! money and percentage fields carry exactly 2 decimals (discount_pct carries 1),
//! dates are `YYYY-MM-DD`, and filenames are stable so reruns are byte-identical.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;

use shopmetrics_core::aggregate::{CustomerClv, ProductPerformance};
use shopmetrics_core::calendar::DateDimensionRow;
use shopmetrics_core::engine::EngineOutput;
use shopmetrics_core::fact::FactRow;
use shopmetrics_core::segment::RfmRow;

use crate::TableError;

pub const SALES_FACT_FILE: &str = "sales_fact.csv";
pub const CUSTOMER_CLV_FILE: &str = "customer_clv.csv";
pub const RFM_FILE: &str = "rfm_segmentation.csv";
pub const PRODUCT_PERFORMANCE_FILE: &str = "product_performance.csv";
pub const DATE_DIMENSION_FILE: &str = "date_dimension.csv";

/// Write the four flat tables into `dir`, creating it if needed. Returns the paths
/// written, in write order.
pub fn export_tables(output: &EngineOutput, dir: &Path) -> Result<Vec<PathBuf>, TableError> {
    fs::create_dir_all(dir)
        .map_err(|source| TableError::CreateDir { path: dir.to_path_buf(), source })?;

    let mut written = Vec::with_capacity(4);
    written.push(write_file(dir, SALES_FACT_FILE, |w| write_sales_fact(&output.sales_fact, w))?);
    written.push(write_file(dir, CUSTOMER_CLV_FILE, |w| {
        write_customer_clv(&output.customer_clv, w)
    })?);
    written.push(write_file(dir, RFM_FILE, |w| write_rfm(&output.rfm_segmentation, w))?);
    written.push(write_file(dir, PRODUCT_PERFORMANCE_FILE, |w| {
        write_product_performance(&output.product_performance, w)
    })?);
    tracing::info!(directory = %dir.display(), files = written.len(), "tables exported");
    Ok(written)
}

/// Write the calendar dimension as its own table.
pub fn write_date_dimension(rows: &[DateDimensionRow], dir: &Path) -> Result<PathBuf, TableError> {
    fs::create_dir_all(dir)
        .map_err(|source| TableError::CreateDir { path: dir.to_path_buf(), source })?;
    write_file(dir, DATE_DIMENSION_FILE, |w| write_dimension_rows(rows, w))
}

fn write_file<F>(dir: &Path, name: &str, write: F) -> Result<PathBuf, TableError>
where
    F: FnOnce(&mut csv::Writer<fs::File>) -> csv::Result<()>,
{
    let path = dir.join(name);
    let to_err = |source: csv::Error| TableError::Write { path: dir.join(name), source };
    let mut writer = csv::Writer::from_path(&path).map_err(to_err)?;
    write(&mut writer).map_err(to_err)?;
    writer.flush().map_err(|source| TableError::Write { path: path.clone(), source: source.into() })?;
    Ok(path)
}

fn money(value: Decimal) -> String {
    format!("{value:.2}")
}

fn one_dp(value: Decimal) -> String {
    format!("{value:.1}")
}

pub fn write_sales_fact<W: Write>(rows: &[FactRow], writer: &mut csv::Writer<W>) -> csv::Result<()> {
    writer.write_record([
        "order_id",
        "order_date",
        "ship_date",
        "ship_mode",
        "region",
        "order_year",
        "order_month",
        "month_name",
        "order_quarter",
        "month_year",
        "shipping_days",
        "customer_id",
        "customer_name",
        "gender",
        "age",
        "age_group",
        "city",
        "state",
        "segment",
        "product_id",
        "product_name",
        "category",
        "sub_category",
        "brand",
        "cost_price",
        "quantity",
        "selling_price",
        "discount",
        "discount_pct",
        "net_price",
        "revenue",
        "total_cost",
        "profit",
        "profit_margin_pct",
        "order_status",
        "is_returned",
    ])?;
    for row in rows {
        writer.write_record([
            row.order_id.0.clone(),
            row.order_date.to_string(),
            row.ship_date.to_string(),
            row.ship_mode.clone(),
            row.region.clone(),
            row.order_year.to_string(),
            row.order_month.to_string(),
            row.month_name.clone(),
            row.order_quarter.to_string(),
            row.month_year.clone(),
            row.shipping_days.to_string(),
            row.customer_id.0.clone(),
            row.customer_name.clone(),
            row.gender.clone(),
            row.age.to_string(),
            row.age_group.clone(),
            row.city.clone(),
            row.state.clone(),
            row.segment.clone(),
            row.product_id.0.clone(),
            row.product_name.clone(),
            row.category.clone(),
            row.sub_category.clone(),
            row.brand.clone(),
            money(row.cost_price),
            row.quantity.to_string(),
            money(row.selling_price),
            money(row.discount),
            one_dp(row.discount_pct),
            money(row.net_price),
            money(row.revenue),
            money(row.total_cost),
            money(row.profit),
            money(row.profit_margin_pct),
            row.order_status.to_string(),
            if row.is_returned { "1" } else { "0" }.to_string(),
        ])?;
    }
    Ok(())
}

pub fn write_customer_clv<W: Write>(
    rows: &[CustomerClv],
    writer: &mut csv::Writer<W>,
) -> csv::Result<()> {
    writer.write_record([
        "customer_id",
        "customer_name",
        "segment",
        "city",
        "state",
        "gender",
        "age",
        "total_orders",
        "total_revenue",
        "avg_order_value",
        "first_order_date",
        "last_order_date",
        "customer_lifespan_days",
        "clv_estimate",
        "clv_tier",
    ])?;
    for row in rows {
        writer.write_record([
            row.customer_id.0.clone(),
            row.customer_name.clone(),
            row.segment.clone(),
            row.city.clone(),
            row.state.clone(),
            row.gender.clone(),
            row.age.to_string(),
            row.total_orders.to_string(),
            money(row.total_revenue),
            money(row.avg_order_value),
            row.first_order_date.to_string(),
            row.last_order_date.to_string(),
            row.customer_lifespan_days.to_string(),
            money(row.clv_estimate),
            row.clv_tier.clone(),
        ])?;
    }
    Ok(())
}

pub fn write_rfm<W: Write>(rows: &[RfmRow], writer: &mut csv::Writer<W>) -> csv::Result<()> {
    writer.write_record([
        "customer_id",
        "customer_name",
        "segment",
        "recency_days",
        "frequency",
        "monetary",
        "r_score",
        "f_score",
        "m_score",
        "rfm_score",
        "rfm_segment",
    ])?;
    for row in rows {
        writer.write_record([
            row.customer_id.0.clone(),
            row.customer_name.clone(),
            row.segment.clone(),
            row.recency_days.to_string(),
            row.frequency.to_string(),
            money(row.monetary),
            row.r_score.to_string(),
            row.f_score.to_string(),
            row.m_score.to_string(),
            row.rfm_score.to_string(),
            row.rfm_segment.clone(),
        ])?;
    }
    Ok(())
}

pub fn write_product_performance<W: Write>(
    rows: &[ProductPerformance],
    writer: &mut csv::Writer<W>,
) -> csv::Result<()> {
    writer.write_record([
        "product_id",
        "product_name",
        "category",
        "sub_category",
        "brand",
        "total_units_sold",
        "total_revenue",
        "total_profit",
        "profit_margin_pct",
    ])?;
    for row in rows {
        writer.write_record([
            row.product_id.0.clone(),
            row.product_name.clone(),
            row.category.clone(),
            row.sub_category.clone(),
            row.brand.clone(),
            row.total_units_sold.to_string(),
            money(row.total_revenue),
            money(row.total_profit),
            money(row.profit_margin_pct),
        ])?;
    }
    Ok(())
}

fn write_dimension_rows<W: Write>(
    rows: &[DateDimensionRow],
    writer: &mut csv::Writer<W>,
) -> csv::Result<()> {
    writer.write_record(["date", "year", "month", "month_name", "quarter", "month_year"])?;
    for row in rows {
        writer.write_record([
            row.date.to_string(),
            row.year.to_string(),
            row.month.to_string(),
            row.month_name.clone(),
            row.quarter.clone(),
            row.month_year.clone(),
        ])?;
    }
    Ok(())
}
