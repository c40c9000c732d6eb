use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Server-generated order identifier. The only input to key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(OrderId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: Uuid,
    pub quantity: u32,
    /// Minor currency units.
    pub price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: Uuid,
    pub line_items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Created,
    Shipped,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
        }
    }
}

/// A status change requested by a caller. Only forward moves exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Ship,
    Complete,
}

impl FromStr for StatusTransition {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shipped" => Ok(StatusTransition::Ship),
            "completed" => Ok(StatusTransition::Complete),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("unknown status '{0}'")]
    UnknownStatus(String),
    #[error("order is already shipped")]
    AlreadyShipped,
    #[error("order is already completed")]
    AlreadyCompleted,
    #[error("order has not been shipped yet")]
    NotShipped,
}

impl Order {
    pub fn new(
        order_id: OrderId,
        customer_id: Uuid,
        line_items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer_id,
            line_items,
            created_at: now,
            shipped_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        if self.completed_at.is_some() {
            OrderStatus::Completed
        } else if self.shipped_at.is_some() {
            OrderStatus::Shipped
        } else {
            OrderStatus::Created
        }
    }

    /// Applies `transition` at time `now`, leaving the order untouched on error.
    ///
    /// Timestamps never go backwards: a `now` earlier than the previous
    /// lifecycle timestamp is clamped up to it.
    pub fn apply(
        &mut self,
        transition: StatusTransition,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        match transition {
            StatusTransition::Ship => {
                if self.completed_at.is_some() {
                    return Err(TransitionError::AlreadyCompleted);
                }
                if self.shipped_at.is_some() {
                    return Err(TransitionError::AlreadyShipped);
                }
                self.shipped_at = Some(now.max(self.created_at));
            }
            StatusTransition::Complete => {
                if self.completed_at.is_some() {
                    return Err(TransitionError::AlreadyCompleted);
                }
                let Some(shipped_at) = self.shipped_at else {
                    return Err(TransitionError::NotShipped);
                };
                self.completed_at = Some(now.max(shipped_at));
            }
        }
        Ok(())
    }
}
