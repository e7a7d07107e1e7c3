//! Foreign-key join resolution
//!
//! For a join `alias:table(cols)` the source row's `<alias>_id` is looked up
//! against the `id` column of `table`. The first match, projected through
//! `cols`, is attached under `alias`; no key or no match attaches `null`.
//! Single level, single related row.

use std::collections::HashMap;

use serde_json::Value;

use super::filter::values_equal;
use super::projection::{pick_columns, Selection};
use crate::storage::{Row, StorageResult, TableStorage};

/// Anything that can hand out the rows of a named table
pub trait RowSource {
    fn rows(&self, table: &str) -> StorageResult<Vec<Row>>;
}

impl RowSource for TableStorage {
    fn rows(&self, table: &str) -> StorageResult<Vec<Row>> {
        self.read(table)
    }
}

/// Resolves projections and joins for a batch of rows
pub struct JoinResolver;

impl JoinResolver {
    /// Project each row and attach its joined rows.
    ///
    /// Every related table is read at most once per call, and only when
    /// some row actually carries a foreign key for it.
    pub fn resolve<S: RowSource + ?Sized>(
        rows: &[Row],
        selection: &Selection,
        source: &S,
    ) -> StorageResult<Vec<Row>> {
        let mut related: HashMap<&str, Vec<Row>> = HashMap::new();
        let mut output = Vec::with_capacity(rows.len());

        for row in rows {
            let mut result = pick_columns(row, &selection.columns);

            for join in &selection.joins {
                let fk_value = row.get(&join.foreign_key()).filter(|v| !v.is_null());

                let attached = match fk_value {
                    Some(fk) => {
                        if !related.contains_key(join.table.as_str()) {
                            related.insert(join.table.as_str(), source.rows(&join.table)?);
                        }
                        related
                            .get(join.table.as_str())
                            .and_then(|target| {
                                target.iter().find(|candidate| {
                                    candidate
                                        .get("id")
                                        .map(|id| values_equal(id, fk))
                                        .unwrap_or(false)
                                })
                            })
                            .map(|found| Value::Object(pick_columns(found, &join.columns)))
                            .unwrap_or(Value::Null)
                    }
                    None => Value::Null,
                };

                result.insert(join.alias.clone(), attached);
            }

            output.push(result);
        }

        Ok(output)
    }
}
