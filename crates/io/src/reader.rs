//! Input loading. One CSV per collection, headers required, fields trimmed. A missing
//! `returns.csv` loads as an empty collection; the other four files are required.

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use shopmetrics_core::domain::{
    Customer, CustomerId, Dataset, Order, OrderId, OrderItem, Product, ProductId, Return,
};

use crate::TableError;

pub const ORDERS_FILE: &str = "orders.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const PRODUCTS_FILE: &str = "products.csv";
pub const ORDER_ITEMS_FILE: &str = "order_items.csv";
pub const RETURNS_FILE: &str = "returns.csv";

#[derive(Debug, Deserialize)]
struct OrderRecord {
    order_id: String,
    customer_id: String,
    order_date: NaiveDate,
    ship_date: NaiveDate,
    ship_mode: String,
    region: String,
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    customer_id: String,
    customer_name: String,
    gender: String,
    age: u32,
    city: String,
    state: String,
    segment: String,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    product_id: String,
    product_name: String,
    category: String,
    sub_category: String,
    brand: String,
    cost_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct OrderItemRecord {
    order_id: String,
    product_id: String,
    quantity: u32,
    unit_price: Decimal,
    /// Absent or empty discounts normalize to zero.
    #[serde(default)]
    discount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ReturnRecord {
    order_id: String,
}

/// Load the full dataset from `dir`. Fails on unreadable or unparseable files; empty
/// required tables are reported later by the engine, not here.
pub fn load_dataset(dir: &Path) -> Result<Dataset, TableError> {
    let orders: Vec<OrderRecord> = load_required(&dir.join(ORDERS_FILE))?;
    let customers: Vec<CustomerRecord> = load_required(&dir.join(CUSTOMERS_FILE))?;
    let products: Vec<ProductRecord> = load_required(&dir.join(PRODUCTS_FILE))?;
    let order_items: Vec<OrderItemRecord> = load_required(&dir.join(ORDER_ITEMS_FILE))?;
    let returns: Vec<ReturnRecord> = load_optional(&dir.join(RETURNS_FILE))?;

    let dataset = Dataset {
        orders: orders
            .into_iter()
            .map(|r| Order {
                id: OrderId(r.order_id),
                customer_id: CustomerId(r.customer_id),
                order_date: r.order_date,
                ship_date: r.ship_date,
                ship_mode: r.ship_mode,
                region: r.region,
            })
            .collect(),
        customers: customers
            .into_iter()
            .map(|r| Customer {
                id: CustomerId(r.customer_id),
                name: r.customer_name,
                gender: r.gender,
                age: r.age,
                city: r.city,
                state: r.state,
                segment: r.segment,
            })
            .collect(),
        products: products
            .into_iter()
            .map(|r| Product {
                id: ProductId(r.product_id),
                name: r.product_name,
                category: r.category,
                sub_category: r.sub_category,
                brand: r.brand,
                cost_price: r.cost_price,
            })
            .collect(),
        order_items: order_items
            .into_iter()
            .map(|r| OrderItem {
                order_id: OrderId(r.order_id),
                product_id: ProductId(r.product_id),
                quantity: r.quantity,
                unit_price: r.unit_price,
                discount: r.discount.unwrap_or(Decimal::ZERO),
            })
            .collect(),
        returns: returns.into_iter().map(|r| Return { order_id: OrderId(r.order_id) }).collect(),
    };

    tracing::debug!(
        orders = dataset.orders.len(),
        customers = dataset.customers.len(),
        products = dataset.products.len(),
        order_items = dataset.order_items.len(),
        returns = dataset.returns.len(),
        "dataset loaded"
    );
    Ok(dataset)
}

fn load_required<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    if !path.exists() {
        return Err(TableError::MissingInput(path.to_path_buf()));
    }
    load_table(path)
}

fn load_optional<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_table(path)
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, TableError> {
    let read_err = |source: csv::Error| TableError::Read { path: path.to_path_buf(), source };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_err)?;
    reader.deserialize().collect::<Result<Vec<T>, csv::Error>>().map_err(read_err)
}
