//! Query subsystem for feedstore
//!
//! # Execution Flow
//!
//! 1. Read the whole table from storage
//! 2. Filter rows by every predicate (AND)
//! 3. Sort by the order column (stable, nulls lowest)
//! 4. Project columns and resolve joins
//! 5. Wrap as array, or first row for `single()`
//!
//! Writes read, modify and rewrite the whole table under a per-table lock.

mod builder;
mod errors;
mod filter;
mod join;
mod projection;
mod request;
mod result;
mod sorter;

pub use builder::{Operation, QueryBuilder};
pub use errors::{QueryError, StoreError, StoreResult};
pub use filter::{values_equal, FilterExpr, FilterOperator, FilterSet};
pub use join::{JoinResolver, RowSource};
pub use projection::{pick_columns, JoinSpec, Selection};
pub use request::QueryRequest;
pub use result::QueryResult;
pub use sorter::{OrderSpec, RowSorter};
