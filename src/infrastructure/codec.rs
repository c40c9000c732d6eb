//! Order <-> stored payload. Records are JSON documents.

use crate::domain::errors::DomainError;
use crate::domain::order::Order;

pub fn encode(key: &str, order: &Order) -> Result<Vec<u8>, DomainError> {
    serde_json::to_vec(order).map_err(|e| DomainError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub fn decode(key: &str, bytes: &[u8]) -> Result<Order, DomainError> {
    serde_json::from_slice(bytes).map_err(|e| DomainError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
