//! # Query Requests
//!
//! A query described as JSON, for hosts that drive the store across a
//! process or language boundary:
//!
//! ```json
//! {
//!   "table": "source_feedback",
//!   "op": "upsert",
//!   "payload": {"source_identifier": "r/rust", "feedback": "like", "topic_id": null},
//!   "on_conflict": "source_identifier,topic_id",
//!   "select": "*",
//!   "single": true
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::builder::{Operation, QueryBuilder};
use super::filter::FilterExpr;
use super::sorter::OrderSpec;
use crate::store::Store;

/// Serializable description of one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub table: String,

    #[serde(default)]
    pub op: Operation,

    /// Read projection, or return projection for writes
    #[serde(default)]
    pub select: Option<String>,

    #[serde(default)]
    pub filters: Vec<FilterExpr>,

    #[serde(default)]
    pub order: Option<OrderSpec>,

    #[serde(default)]
    pub single: bool,

    #[serde(default)]
    pub payload: Option<Value>,

    #[serde(default)]
    pub on_conflict: Option<String>,
}

impl QueryRequest {
    /// Build the equivalent fluent query against `store`
    pub fn into_builder(self, store: &Store) -> QueryBuilder {
        let payload = self.payload.unwrap_or(Value::Null);
        let mut builder = store.from(self.table);

        builder = match self.op {
            Operation::Select => builder,
            Operation::Insert => builder.insert(payload),
            Operation::Upsert => builder.upsert(payload, self.on_conflict.as_deref()),
            Operation::Update => builder.update(payload),
            Operation::Delete => builder.delete(),
        };

        if let Some(select) = &self.select {
            builder = builder.select(select);
        }
        for filter in self.filters {
            builder = builder.filter(filter);
        }
        if let Some(order) = self.order {
            builder = builder.order(&order.column, order.ascending);
        }
        if self.single {
            builder = builder.single();
        }

        builder
    }
}
