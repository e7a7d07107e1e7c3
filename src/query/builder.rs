//! # Query Builder
//!
//! Fluent accumulator for one query. Configuration calls only record state;
//! `execute()` consumes the builder, performs the operation once and always
//! returns a `QueryResult`. Faults never escape as `Err` or panics: they are
//! converted into the result's error channel.
//!
//! Execution by operation:
//!
//! - select: read, filter, order, project and join, wrap per `single()`
//! - insert: `{id, ...payload, created_at}` appended
//! - upsert: first row matching every conflict column is merged with
//!   `{...payload, updated_at}`, otherwise inserted as above
//! - update: every filtered row merged with `{...payload, updated_at}`
//! - delete: every filtered row removed
//!
//! Update and delete without filters touch every row of the table.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QueryError, StoreError, StoreResult};
use super::filter::{values_equal, FilterExpr, FilterOperator, FilterSet};
use super::join::JoinResolver;
use super::projection::{pick_columns, Selection};
use super::result::QueryResult;
use super::sorter::{OrderSpec, RowSorter};
use crate::observability::Logger;
use crate::storage::{validate_table_name, Row};
use crate::store::Store;

/// Operation performed by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Upsert => "upsert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    fn returns_rows(&self) -> bool {
        matches!(self, Operation::Insert | Operation::Upsert | Operation::Update)
    }
}

/// Builder for a single query against one table
#[derive(Debug)]
pub struct QueryBuilder {
    store: Store,
    table: String,
    op: Operation,
    selection: String,
    return_selection: Option<String>,
    filters: FilterSet,
    order: Option<OrderSpec>,
    single: bool,
    payload: Option<Value>,
    on_conflict: Option<String>,
}

impl QueryBuilder {
    pub(crate) fn new(store: Store, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
            op: Operation::Select,
            selection: "*".to_string(),
            return_selection: None,
            filters: FilterSet::new(),
            order: None,
            single: false,
            payload: None,
            on_conflict: None,
        }
    }

    /// Table this query targets
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Operation this query will perform
    pub fn operation(&self) -> Operation {
        self.op
    }

    /// Set the projection.
    ///
    /// After `insert`, `upsert` or `update` this is the projection of the
    /// rows returned by the write; otherwise it is the read projection.
    /// An empty spec selects every column.
    pub fn select(mut self, spec: &str) -> Self {
        let spec = if spec.trim().is_empty() { "*" } else { spec };
        if self.op.returns_rows() {
            self.return_selection = Some(spec.to_string());
        } else {
            self.selection = spec.to_string();
        }
        self
    }

    /// `column == value`
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::eq(column, value.into()))
    }

    /// `column` is one of `values`
    pub fn in_list<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.filter(FilterExpr::in_list(column, values))
    }

    /// `column > value`
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::new(column, FilterOperator::Gt, value.into()))
    }

    /// `column >= value`
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::new(column, FilterOperator::Gte, value.into()))
    }

    /// `column < value`
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::new(column, FilterOperator::Lt, value.into()))
    }

    /// `column <= value`
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(FilterExpr::new(column, FilterOperator::Lte, value.into()))
    }

    /// Append an arbitrary predicate
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    /// Order by one column; replaces any earlier ordering
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(OrderSpec {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Return the first row (or null) instead of an array
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn insert(mut self, payload: Value) -> Self {
        self.op = Operation::Insert;
        self.payload = Some(payload);
        self
    }

    /// Insert or merge, matching existing rows on the comma-separated
    /// `on_conflict` columns (`id` when `None`).
    ///
    /// A conflict column missing from the payload matches no row, so the
    /// upsert inserts.
    pub fn upsert(mut self, payload: Value, on_conflict: Option<&str>) -> Self {
        self.op = Operation::Upsert;
        self.payload = Some(payload);
        self.on_conflict = on_conflict.map(str::to_string);
        self
    }

    pub fn update(mut self, payload: Value) -> Self {
        self.op = Operation::Update;
        self.payload = Some(payload);
        self
    }

    pub fn delete(mut self) -> Self {
        self.op = Operation::Delete;
        self
    }

    /// Run the query.
    ///
    /// A panic raised by an injected clock, id source or codec is caught and
    /// reported as `FEED_INTERNAL`.
    pub fn execute(self) -> QueryResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run()))
            .unwrap_or_else(|payload| {
                Err(StoreError::Internal(format!(
                    "query panicked: {}",
                    panic_message(&*payload)
                )))
            });

        match outcome {
            Ok(result) => {
                self.store.metrics().increment_queries_executed();
                let rows = match &result.data {
                    Value::Array(items) => items.len(),
                    Value::Null => 0,
                    _ => 1,
                };
                let rows = rows.to_string();
                Logger::trace(
                    "QUERY_EXECUTED",
                    &[
                        ("table", self.table.as_str()),
                        ("op", self.op.as_str()),
                        ("rows", rows.as_str()),
                    ],
                );
                result
            }
            Err(err) => {
                self.store.metrics().increment_queries_failed();
                let error = QueryError::from(err);
                Logger::error(
                    "QUERY_FAILED",
                    &[
                        ("table", self.table.as_str()),
                        ("op", self.op.as_str()),
                        ("code", error.code.as_str()),
                        ("message", error.message.as_str()),
                    ],
                );
                QueryResult::err(error)
            }
        }
    }

    /// Run the query on the blocking thread pool
    pub async fn execute_async(self) -> QueryResult {
        let store = self.store.clone();
        let table = self.table.clone();
        let op = self.op;

        match tokio::task::spawn_blocking(move || self.execute()).await {
            Ok(result) => result,
            Err(e) => {
                store.metrics().increment_queries_failed();
                let error = QueryError::from(StoreError::Internal(format!(
                    "query task failed: {}",
                    e
                )));
                Logger::error(
                    "QUERY_FAILED",
                    &[
                        ("table", table.as_str()),
                        ("op", op.as_str()),
                        ("code", error.code.as_str()),
                        ("message", error.message.as_str()),
                    ],
                );
                QueryResult::err(error)
            }
        }
    }

    fn run(&self) -> StoreResult<QueryResult> {
        match self.op {
            Operation::Select => self.exec_select(),
            Operation::Insert => self.exec_insert(),
            Operation::Upsert => self.exec_upsert(),
            Operation::Update => self.exec_update(),
            Operation::Delete => self.exec_delete(),
        }
    }

    fn read_rows(&self, table: &str) -> StoreResult<Vec<Row>> {
        let rows = self.store.storage().read(table)?;
        self.store.metrics().add_rows_read(rows.len() as u64);
        Ok(rows)
    }

    fn write_rows(&self, rows: &[Row]) -> StoreResult<()> {
        self.store.storage().write(&self.table, rows)?;
        self.store.metrics().add_rows_written(rows.len() as u64);
        Ok(())
    }

    fn payload_row(&self) -> StoreResult<Row> {
        match &self.payload {
            Some(Value::Object(row)) => Ok(row.clone()),
            Some(other) => Err(StoreError::InvalidPayload(format!(
                "expected a JSON object, found {}",
                describe(other)
            ))),
            None => Err(StoreError::InvalidPayload("missing payload".to_string())),
        }
    }

    /// `{id: fresh, ...payload, created_at: now}`
    fn new_row(&self, payload: Row) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), Value::String(self.store.fresh_id()));
        row.extend(payload);
        row.insert("created_at".to_string(), Value::String(self.store.now()));
        row
    }

    /// Merge `payload` plus `updated_at: now` into `row`
    fn merge_into(&self, row: &mut Row, payload: &Row) {
        for (key, value) in payload {
            row.insert(key.clone(), value.clone());
        }
        row.insert("updated_at".to_string(), Value::String(self.store.now()));
    }

    /// Projected write result, or null data when no projection was requested
    fn returning(&self, rows: Vec<Row>) -> QueryResult {
        match &self.return_selection {
            Some(spec) => {
                let columns = Selection::parse(spec).columns;
                let projected = rows.iter().map(|row| pick_columns(row, &columns)).collect();
                QueryResult::rows(projected, self.single)
            }
            None => QueryResult::empty(),
        }
    }

    fn exec_select(&self) -> StoreResult<QueryResult> {
        let rows = self.read_rows(&self.table)?;
        let mut filtered = self.filters.apply(&rows);

        if let Some(order) = &self.order {
            RowSorter::sort(&mut filtered, order);
        }

        let selection = Selection::parse(&self.selection);
        let resolved = JoinResolver::resolve(&filtered, &selection, self.store.storage())?;

        Ok(QueryResult::rows(resolved, self.single))
    }

    fn exec_insert(&self) -> StoreResult<QueryResult> {
        let payload = self.payload_row()?;
        let lock = self.lock_table()?;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut rows = self.read_rows(&self.table)?;
        let row = self.new_row(payload);
        rows.push(row.clone());
        self.write_rows(&rows)?;

        Ok(self.returning(vec![row]))
    }

    fn exec_upsert(&self) -> StoreResult<QueryResult> {
        let payload = self.payload_row()?;
        let conflict_keys = self.conflict_keys();

        let missing: Vec<&str> = conflict_keys
            .iter()
            .filter(|key| !payload.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            let missing = missing.join(",");
            Logger::warn(
                "UPSERT_CONFLICT_KEY_MISSING",
                &[("table", self.table.as_str()), ("columns", missing.as_str())],
            );
        }

        let lock = self.lock_table()?;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut rows = self.read_rows(&self.table)?;
        let existing = rows.iter().position(|row| {
            conflict_keys.iter().all(|key| match (row.get(key), payload.get(key)) {
                (Some(stored), Some(incoming)) => values_equal(stored, incoming),
                _ => false,
            })
        });

        let affected = match existing {
            Some(index) => {
                self.merge_into(&mut rows[index], &payload);
                rows[index].clone()
            }
            None => {
                let row = self.new_row(payload);
                rows.push(row.clone());
                row
            }
        };

        self.write_rows(&rows)?;
        Ok(self.returning(vec![affected]))
    }

    fn exec_update(&self) -> StoreResult<QueryResult> {
        let payload = self.payload_row()?;
        let lock = self.lock_table()?;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut rows = self.read_rows(&self.table)?;
        for row in rows.iter_mut() {
            if self.filters.matches(row) {
                self.merge_into(row, &payload);
            }
        }

        self.write_rows(&rows)?;

        if self.return_selection.is_none() {
            return Ok(QueryResult::empty());
        }
        Ok(self.returning(self.filters.apply(&rows)))
    }

    fn exec_delete(&self) -> StoreResult<QueryResult> {
        let lock = self.lock_table()?;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let rows = self.read_rows(&self.table)?;
        let deleted_ids: Vec<Value> = rows
            .iter()
            .filter(|row| self.filters.matches(row))
            .map(|row| row.get("id").cloned().unwrap_or(Value::Null))
            .collect();

        let remaining: Vec<Row> = rows
            .into_iter()
            .filter(|row| {
                let id = row.get("id").unwrap_or(&Value::Null);
                !deleted_ids.iter().any(|deleted| values_equal(deleted, id))
            })
            .collect();

        self.write_rows(&remaining)?;
        Ok(QueryResult::empty())
    }

    /// Per-table write lock; the name is validated first so rejected names
    /// never get a lock entry
    fn lock_table(&self) -> StoreResult<Arc<Mutex<()>>> {
        validate_table_name(&self.table)?;
        Ok(self.store.table_lock(&self.table))
    }

    fn conflict_keys(&self) -> Vec<String> {
        let keys: Vec<String> = self
            .on_conflict
            .as_deref()
            .unwrap_or("id")
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        if keys.is_empty() {
            vec!["id".to_string()]
        } else {
            keys
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
