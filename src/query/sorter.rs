//! Row ordering
//!
//! Sorts rows by a single column. Sort is stable: rows with equal keys keep
//! their relative order in both directions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::storage::Row;

/// Single-column order specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    /// Column to sort by
    pub column: String,
    /// Direction; ascending when omitted
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl OrderSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Sorts rows
pub struct RowSorter;

impl RowSorter {
    /// Sorts rows in place according to the order specification.
    ///
    /// Null and absent values are the lowest keys: first when ascending,
    /// last when descending.
    pub fn sort(rows: &mut [Row], spec: &OrderSpec) {
        rows.sort_by(|a, b| {
            let ordering = Self::compare_values(a.get(&spec.column), b.get(&spec.column));
            if spec.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
    }

    /// Absent and null are the same key and rank below every value.
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (ranked(a), ranked(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some((ra, _)), Some((rb, _))) if ra != rb => ra.cmp(&rb),
            (Some((_, Value::Bool(x))), Some((_, Value::Bool(y)))) => x.cmp(y),
            (Some((_, Value::Number(x))), Some((_, Value::Number(y)))) => compare_numbers(x, y),
            (Some((_, Value::String(x))), Some((_, Value::String(y)))) => x.cmp(y),
            // arrays and objects are unordered among themselves
            _ => Ordering::Equal,
        }
    }
}

fn ranked(value: Option<&Value>) -> Option<(u8, &Value)> {
    value.filter(|v| !v.is_null()).map(|v| (rank(v), v))
}

/// Cross-type rank: bool < number < string < array < object
fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    match (x.as_i64(), y.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn tags(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["tag"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_sort_ascending() {
        let mut rows = vec![
            row(json!({"tag": "c", "sort_order": 3})),
            row(json!({"tag": "a", "sort_order": 1})),
            row(json!({"tag": "b", "sort_order": 2})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::asc("sort_order"));
        assert_eq!(tags(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_descending() {
        let mut rows = vec![
            row(json!({"tag": "b", "created_at": "2026-01-02"})),
            row(json!({"tag": "c", "created_at": "2026-01-03"})),
            row(json!({"tag": "a", "created_at": "2026-01-01"})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::desc("created_at"));
        assert_eq!(tags(&rows), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_nulls_first_ascending_and_stable() {
        let mut rows = vec![
            row(json!({"tag": "n1", "k": null})),
            row(json!({"tag": "one", "k": 1})),
            row(json!({"tag": "n2", "k": null})),
            row(json!({"tag": "two", "k": 2})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::asc("k"));
        assert_eq!(tags(&rows), vec!["n1", "n2", "one", "two"]);
    }

    #[test]
    fn test_nulls_last_descending_and_stable() {
        let mut rows = vec![
            row(json!({"tag": "n1", "k": null})),
            row(json!({"tag": "one", "k": 1})),
            row(json!({"tag": "missing"})),
            row(json!({"tag": "two", "k": 2})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::desc("k"));
        assert_eq!(tags(&rows), vec!["two", "one", "n1", "missing"]);
    }

    #[test]
    fn test_sort_stable_on_equal_keys() {
        let mut rows = vec![
            row(json!({"tag": "a", "k": 5})),
            row(json!({"tag": "b", "k": 5})),
            row(json!({"tag": "c", "k": 5})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::asc("k"));
        assert_eq!(tags(&rows), vec!["a", "b", "c"]);

        RowSorter::sort(&mut rows, &OrderSpec::desc("k"));
        assert_eq!(tags(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_numbers_compare_numerically() {
        let mut rows = vec![
            row(json!({"tag": "ten", "k": 10})),
            row(json!({"tag": "nine", "k": 9.5})),
            row(json!({"tag": "neg", "k": -1})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::asc("k"));
        assert_eq!(tags(&rows), vec!["neg", "nine", "ten"]);
    }

    #[test]
    fn test_mixed_types_follow_rank() {
        let mut rows = vec![
            row(json!({"tag": "object", "k": {"a": 1}})),
            row(json!({"tag": "string", "k": "10"})),
            row(json!({"tag": "array", "k": [1]})),
            row(json!({"tag": "number", "k": 2.5})),
            row(json!({"tag": "bool", "k": true})),
        ];

        RowSorter::sort(&mut rows, &OrderSpec::asc("k"));
        assert_eq!(tags(&rows), vec!["bool", "number", "string", "array", "object"]);
    }

    #[test]
    fn test_order_spec_defaults_ascending() {
        let spec: OrderSpec = serde_json::from_value(json!({"column": "sort_order"})).unwrap();
        assert_eq!(spec, OrderSpec::asc("sort_order"));
    }
}
