//! Storage error types
//!
//! Error codes:
//! - FEED_STORAGE_IO_ERROR - filesystem failure while reading or writing a table
//! - FEED_STORAGE_CORRUPT - table file does not decode to a row collection
//! - FEED_INVALID_TABLE - table name cannot be mapped to a file

use std::fmt;
use std::io;

use thiserror::Error;

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    FeedStorageIoError,
    /// Table file could not be decoded
    FeedStorageCorrupt,
    /// Table name rejected
    FeedInvalidTable,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::FeedStorageIoError => "FEED_STORAGE_IO_ERROR",
            StorageErrorCode::FeedStorageCorrupt => "FEED_STORAGE_CORRUPT",
            StorageErrorCode::FeedInvalidTable => "FEED_INVALID_TABLE",
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("I/O error on table '{table}': {message}: {source}")]
    Io {
        table: String,
        message: String,
        #[source]
        source: io::Error,
    },

    /// Table file exists but cannot be decoded
    #[error("Corrupt table '{table}': {reason}")]
    Corrupt { table: String, reason: String },

    /// Table name contains characters that cannot name a file
    #[error("Invalid table name: '{0}'")]
    InvalidTable(String),
}

impl StorageError {
    /// Create an I/O error for the given table
    pub fn io(table: impl Into<String>, message: impl Into<String>, source: io::Error) -> Self {
        StorageError::Io {
            table: table.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a corruption error for the given table
    pub fn corrupt(table: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Corrupt {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        match self {
            StorageError::Io { .. } => StorageErrorCode::FeedStorageIoError,
            StorageError::Corrupt { .. } => StorageErrorCode::FeedStorageCorrupt,
            StorageError::InvalidTable(_) => StorageErrorCode::FeedInvalidTable,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
