//! Store metrics
//!
//! Counters only, monotonic, reset on process start.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one store handle
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Queries that returned without an error
    queries_executed: AtomicU64,
    /// Queries that surfaced an error
    queries_failed: AtomicU64,
    /// Rows loaded from table files
    rows_read: AtomicU64,
    /// Rows persisted to table files
    rows_written: AtomicU64,
}

impl StoreMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_rows_read(&self, rows: u64) {
        self.rows_read.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn add_rows_written(&self, rows: u64) {
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn queries_executed(&self) -> u64 {
        self.queries_executed.load(Ordering::Relaxed)
    }

    pub fn queries_failed(&self) -> u64 {
        self.queries_failed.load(Ordering::Relaxed)
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read.load(Ordering::Relaxed)
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    /// Snapshot of all counters, keys sorted
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("queries_executed", self.queries_executed()),
            ("queries_failed", self.queries_failed()),
            ("rows_read", self.rows_read()),
            ("rows_written", self.rows_written()),
        ]
    }
}
