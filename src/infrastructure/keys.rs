use crate::domain::order::OrderId;

/// Name of the set holding the key of every live order.
pub const INDEX_KEY: &str = "orders";

const ORDER_KEY_PREFIX: &str = "order:";

pub fn order_key(id: OrderId) -> String {
    format!("{ORDER_KEY_PREFIX}{id}")
}
