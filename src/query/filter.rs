//! # Filter Predicates
//!
//! Strict predicates over rows. No type coercion: a string never equals a
//! number, and a field absent from a row matches nothing (not even `null`).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::Row;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equals
    Eq,
    /// Value in list
    In,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
}

impl FilterOperator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::In => "in",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
        }
    }
}

/// A single predicate: `column <op> value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Column to test
    pub column: String,

    /// Comparison operator
    #[serde(rename = "op")]
    pub operator: FilterOperator,

    /// Literal to compare against; an array for `in`
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self::new(column, FilterOperator::Eq, value)
    }

    /// Create a membership filter
    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(column, FilterOperator::In, Value::Array(values))
    }

    /// Check if a row satisfies this predicate
    pub fn matches(&self, row: &Row) -> bool {
        let field_value = match row.get(&self.column) {
            Some(v) => v,
            None => return false,
        };

        match self.operator {
            FilterOperator::Eq => values_equal(field_value, &self.value),
            FilterOperator::In => match self.value.as_array() {
                Some(set) => set.iter().any(|candidate| values_equal(field_value, candidate)),
                None => false,
            },
            FilterOperator::Gt => range_cmp(field_value, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                range_cmp(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => range_cmp(field_value, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                range_cmp(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Strict value equality.
///
/// Same JSON type and same value; numbers compare by numeric value so that
/// `1` and `1.0` are equal. Arrays and objects compare structurally.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Ordering for range predicates: numbers with numbers, strings with strings
fn range_cmp(actual: &Value, bound: &Value) -> Option<Ordering> {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A set of predicates combined with AND logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub filters: Vec<FilterExpr>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, filter: FilterExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: FilterExpr) {
        self.filters.push(filter);
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Check if a row matches all predicates
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Rows satisfying every predicate, in their original order
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().filter(|row| self.matches(row)).cloned().collect()
    }
}
