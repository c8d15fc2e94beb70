pub mod customer;
pub mod order;
pub mod product;

pub use customer::{Customer, CustomerId};
pub use order::{Order, OrderId, OrderItem, Return};
pub use product::{Product, ProductId};

use serde::{Deserialize, Serialize};

/// The five input collections of one extraction run. Immutable once loaded; every
/// derived table is recomputed from scratch against it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub orders: Vec<Order>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub order_items: Vec<OrderItem>,
    pub returns: Vec<Return>,
}
