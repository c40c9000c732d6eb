use std::sync::Arc;

use chrono::Utc;
use log::warn;
use uuid::Uuid;

use crate::domain::context::Context;
use crate::domain::errors::DomainError;
use crate::domain::order::{LineItem, Order, OrderId, StatusTransition};
use crate::domain::page::{FindAllPage, FindResult};
use crate::domain::ports::{IdGenerator, OrderRepository, RandomIdGenerator};

/// How many fresh ids `create_order` tries before giving up on collisions.
const MAX_ID_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    ids: Arc<dyn IdGenerator>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self::with_id_generator(repo, Arc::new(RandomIdGenerator))
    }

    pub fn with_id_generator(repo: Arc<dyn OrderRepository>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repo, ids }
    }

    pub async fn create_order(
        &self,
        cx: &Context,
        customer_id: Uuid,
        line_items: Vec<LineItem>,
    ) -> Result<Order, DomainError> {
        if let Some(pos) = line_items.iter().position(|l| l.quantity == 0) {
            return Err(DomainError::InvalidInput(format!(
                "line item {} has a zero quantity",
                pos
            )));
        }

        let mut attempt = 1;
        loop {
            let order = Order::new(self.ids.next_id(), customer_id, line_items.clone(), Utc::now());
            match self.repo.insert(cx, &order).await {
                Ok(()) => return Ok(order),
                Err(DomainError::Duplicate { key }) if attempt < MAX_ID_ATTEMPTS => {
                    warn!("Order id collision on {}, retrying with a new id", key);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_order(&self, cx: &Context, id: OrderId) -> Result<Order, DomainError> {
        self.repo.find_by_id(cx, id).await
    }

    pub async fn list_orders(
        &self,
        cx: &Context,
        page: FindAllPage,
    ) -> Result<FindResult, DomainError> {
        self.repo.find_all(cx, page).await
    }

    /// Loads the order, applies `transition`, and writes it back.
    ///
    /// An invalid transition fails before anything is written.
    pub async fn update_status(
        &self,
        cx: &Context,
        id: OrderId,
        transition: StatusTransition,
    ) -> Result<Order, DomainError> {
        let mut order = self.repo.find_by_id(cx, id).await?;
        order.apply(transition, Utc::now())?;
        self.repo.update(cx, &order).await?;
        Ok(order)
    }

    pub async fn delete_order(&self, cx: &Context, id: OrderId) -> Result<(), DomainError> {
        self.repo.delete_by_id(cx, id).await
    }
}
