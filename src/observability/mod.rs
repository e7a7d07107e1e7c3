//! Observability subsystem for feedstore
//!
//! - Structured logging (JSON lines)
//! - Counters per store handle
//!
//! Observability is read-only: nothing here changes query results.

mod logger;
mod metrics;

pub use logger::{Logger, Severity};
pub use metrics::StoreMetrics;
