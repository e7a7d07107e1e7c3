//! feedstore - an embedded, file-backed document store with a fluent,
//! relational-style query builder
//!
//! Each table is a JSON array of objects in `<root>/<table>.json`. Queries
//! never panic or return `Err`: every terminal call yields a
//! [`QueryResult`] carrying either `data` or an `error`.
//!
//! ```no_run
//! use feedstore::Store;
//! use serde_json::json;
//!
//! let store = Store::open("./data/db");
//! let created = store
//!     .from("topics")
//!     .insert(json!({"name": "rust", "is_active": true}))
//!     .select("*")
//!     .single()
//!     .execute();
//! assert!(created.is_ok());
//!
//! let active = store
//!     .from("topics")
//!     .select("id, name")
//!     .eq("is_active", true)
//!     .order("name", true)
//!     .execute();
//! println!("{}", active.data);
//! ```

pub mod cli;
pub mod config;
pub mod observability;
pub mod query;
pub mod storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use query::{Operation, QueryBuilder, QueryError, QueryRequest, QueryResult, StoreError};
pub use storage::Row;
pub use store::Store;
