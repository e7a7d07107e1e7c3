//! Table storage subsystem for feedstore
//!
//! Holds the durable image of every table: one JSON array of rows per file.
//!
//! # Design Principles
//!
//! - Whole-table reads and writes (no partial updates on disk)
//! - Atomic replacement via temp file + rename
//! - Lazy creation of the storage root
//! - Missing table file = empty table

mod codec;
mod errors;
mod table;

pub use codec::{JsonCodec, Row, TableCodec};
pub use errors::{StorageError, StorageErrorCode, StorageResult};
pub use table::{validate_table_name, TableStorage};
