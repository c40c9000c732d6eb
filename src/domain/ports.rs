use async_trait::async_trait;

use super::context::Context;
use super::errors::DomainError;
use super::order::{Order, OrderId};
use super::page::{FindAllPage, FindResult};

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Stores a new order together with its index entry. Never overwrites.
    async fn insert(&self, cx: &Context, order: &Order) -> Result<(), DomainError>;
    async fn find_by_id(&self, cx: &Context, id: OrderId) -> Result<Order, DomainError>;
    /// Replaces an existing order. Never creates.
    async fn update(&self, cx: &Context, order: &Order) -> Result<(), DomainError>;
    async fn delete_by_id(&self, cx: &Context, id: OrderId) -> Result<(), DomainError>;
    async fn find_all(&self, cx: &Context, page: FindAllPage) -> Result<FindResult, DomainError>;
}

pub trait IdGenerator: Send + Sync + 'static {
    fn next_id(&self) -> OrderId;
}

/// Uniformly random 64-bit ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> OrderId {
        OrderId(rand::random())
    }
}
