//! # Query Errors
//!
//! `StoreError` is what internal steps return; `QueryError` is the
//! serializable descriptor placed in a result's error channel.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Result type for internal query steps
pub type StoreResult<T> = Result<T, StoreError>;

/// Faults raised while executing a query
#[derive(Debug, Error)]
pub enum StoreError {
    /// Table storage failure
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Write payload is not a JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Anything unexpected
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Stable string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Storage(e) => e.code().code(),
            StoreError::InvalidPayload(_) => "FEED_INVALID_PAYLOAD",
            StoreError::Internal(_) => "FEED_INTERNAL",
        }
    }
}

/// Error descriptor carried in `QueryResult::error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryError {
    pub message: String,
    pub code: String,
}

impl QueryError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for QueryError {}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}
