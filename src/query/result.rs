//! Query result: `{ data, error }`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::QueryError;
use crate::storage::Row;

/// Outcome of one executed query.
///
/// On success `error` is `None` and `data` is null, a single row or an
/// array of rows. On failure `data` is null and `error` describes the fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Value,
    pub error: Option<QueryError>,
}

impl QueryResult {
    /// Successful result
    pub fn ok(data: Value) -> Self {
        Self { data, error: None }
    }

    /// Successful result without data
    pub fn empty() -> Self {
        Self::ok(Value::Null)
    }

    /// Failed result
    pub fn err(error: QueryError) -> Self {
        Self {
            data: Value::Null,
            error: Some(error),
        }
    }

    /// Wrap rows as an array, or as the first row (or null) for single-row queries
    pub fn rows(rows: Vec<Row>, single: bool) -> Self {
        if single {
            Self::ok(rows.into_iter().next().map(Value::Object).unwrap_or(Value::Null))
        } else {
            Self::ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Convert into a `Result` for `?`-style call sites
    pub fn into_result(self) -> Result<Value, QueryError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    /// Deserialize `data` into a caller-supplied type.
    ///
    /// A null payload decodes as whatever `T` makes of null, so
    /// `Option<Row>` and `Option<MyStruct>` both work for `single()` queries.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, QueryError> {
        let data = self.into_result()?;
        serde_json::from_value(data)
            .map_err(|e| QueryError::new("FEED_DECODE_ERROR", format!("failed to decode data: {}", e)))
    }
}
