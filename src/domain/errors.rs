use std::error::Error as StdError;

use thiserror::Error;

use super::order::TransitionError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("order not found: {key}")]
    NotFound { key: String },

    #[error("order already exists: {key}")]
    Duplicate { key: String },

    #[error("failed to encode order {key}: {reason}")]
    Encode { key: String, reason: String },

    /// Stored bytes are unreadable, or an indexed record is missing.
    #[error("failed to decode order {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("{op} failed for {key}: {source}")]
    Engine {
        op: &'static str,
        key: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{op} aborted: {cause}")]
    Cancelled { op: &'static str, cause: &'static str },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(#[from] TransitionError),
}

impl DomainError {
    pub(crate) fn engine(
        op: &'static str,
        key: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        DomainError::Engine {
            op,
            key: key.into(),
            source: Box::new(source),
        }
    }
}
