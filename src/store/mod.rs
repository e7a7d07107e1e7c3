//! # Store Facade
//!
//! The handle callers hold. `Store::from(table)` starts a fresh query
//! builder; builders are never shared between queries.
//!
//! ```ignore
//! use feedstore::Store;
//! use serde_json::json;
//!
//! let store = Store::open("./data/db");
//! let result = store
//!     .from("topics")
//!     .insert(json!({"name": "rust"}))
//!     .select("*")
//!     .single()
//!     .execute();
//! ```

mod clock;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub use clock::{
    format_timestamp, Clock, IdGenerator, SequentialIds, SteppingClock, SystemClock, UuidGenerator,
};

use crate::config::StoreConfig;
use crate::observability::{Logger, StoreMetrics};
use crate::query::QueryBuilder;
use crate::storage::{JsonCodec, StorageResult, TableStorage};

/// Shared state behind a store handle
struct StoreInner {
    storage: TableStorage,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    metrics: StoreMetrics,
    /// Serializes read-modify-write cycles per table
    table_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Handle to a file-backed store.
///
/// Cheap to clone; clones share storage, locks and metrics.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.inner.storage.root())
            .finish()
    }
}

impl Store {
    /// Open a store rooted at `root` with wall-clock timestamps and UUID ids.
    ///
    /// The directory is created on first use, not here.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self::with_components(
            TableStorage::new(root.as_ref()),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        )
    }

    /// Open a store from configuration; also applies the configured log level
    pub fn from_config(config: &StoreConfig) -> Self {
        if let Ok(severity) = config.severity() {
            Logger::set_min_severity(severity);
        }

        let codec = if config.pretty {
            JsonCodec::pretty()
        } else {
            JsonCodec::compact()
        };

        Self::with_components(
            TableStorage::with_codec(config.data_path(), Arc::new(codec)),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
        )
    }

    /// Assemble a store from explicit parts
    pub fn with_components(
        storage: TableStorage,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let root = storage.root().display().to_string();
        Logger::info("STORE_OPENED", &[("root", root.as_str())]);

        Self {
            inner: Arc::new(StoreInner {
                storage,
                clock,
                ids,
                metrics: StoreMetrics::new(),
                table_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start a query against `table`
    pub fn from(&self, table: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(self.clone(), table)
    }

    /// Names of tables that have been written, sorted
    pub fn list_tables(&self) -> StorageResult<Vec<String>> {
        self.inner.storage.list_tables()
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        self.inner.storage.root()
    }

    /// Counters for this store
    pub fn metrics(&self) -> &StoreMetrics {
        &self.inner.metrics
    }

    pub(crate) fn storage(&self) -> &TableStorage {
        &self.inner.storage
    }

    pub(crate) fn now(&self) -> String {
        self.inner.clock.now()
    }

    pub(crate) fn fresh_id(&self) -> String {
        self.inner.ids.fresh_id()
    }

    /// Lock guarding mutations of one table
    pub(crate) fn table_lock(&self, table: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .inner
            .table_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        locks
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
impl Store {
    /// Number of tables holding a lock entry
    pub(crate) fn locked_table_count(&self) -> usize {
        self.inner
            .table_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
