//! Table file storage
//!
//! Each table lives in `<root>/<table>.json`. Writes replace the whole file
//! through a temp file and rename, so a reader only ever sees a complete
//! previous or complete new image.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{JsonCodec, Row, TableCodec};
use super::errors::{StorageError, StorageResult};
use crate::observability::Logger;

/// Extension of table files
const TABLE_EXTENSION: &str = "json";

/// Extension of in-flight temp files
const TEMP_EXTENSION: &str = "tmp";

/// Maximum accepted table name length
const MAX_TABLE_NAME_LEN: usize = 128;

/// Reads and writes whole row collections per table
#[derive(Clone)]
pub struct TableStorage {
    root: PathBuf,
    codec: Arc<dyn TableCodec>,
}

impl std::fmt::Debug for TableStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStorage").field("root", &self.root).finish()
    }
}

impl TableStorage {
    /// Create storage rooted at `root` with the default JSON codec.
    ///
    /// Nothing is touched on disk until the first read or write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codec(root, Arc::new(JsonCodec::default()))
    }

    /// Create storage with a custom codec
    pub fn with_codec(root: impl Into<PathBuf>, codec: Arc<dyn TableCodec>) -> Self {
        Self {
            root: root.into(),
            codec,
        }
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `table`
    pub fn table_path(&self, table: &str) -> StorageResult<PathBuf> {
        validate_table_name(table)?;
        Ok(self.root.join(format!("{}.{}", table, TABLE_EXTENSION)))
    }

    /// Read all rows of a table.
    ///
    /// A table with no backing file is empty.
    pub fn read(&self, table: &str) -> StorageResult<Vec<Row>> {
        let path = self.table_path(table)?;
        self.ensure_root(table)?;

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(table, "failed to read table file", e)),
        };

        self.codec
            .decode(&bytes)
            .map_err(|reason| StorageError::corrupt(table, reason))
    }

    /// Replace all rows of a table.
    ///
    /// 1. Encode to a uniquely named `<table>.<random>.json.tmp` in the root
    /// 2. fsync the temp file
    /// 3. Rename over `<table>.json`
    /// 4. fsync the directory (best effort)
    ///
    /// Each write owns its temp file, including writers in other processes.
    /// The temp file is removed on any failure before the rename.
    pub fn write(&self, table: &str, rows: &[Row]) -> StorageResult<()> {
        let path = self.table_path(table)?;
        self.ensure_root(table)?;

        let bytes = self
            .codec
            .encode(rows)
            .map_err(|reason| StorageError::corrupt(table, reason))?;

        let temp_suffix = format!(".{}.{}", TABLE_EXTENSION, TEMP_EXTENSION);
        let mut temp = tempfile::Builder::new()
            .prefix(&format!("{}.", table))
            .suffix(&temp_suffix)
            .tempfile_in(&self.root)
            .map_err(|e| StorageError::io(table, "failed to create temp table file", e))?;

        temp.write_all(&bytes)
            .map_err(|e| StorageError::io(table, "failed to write temp table file", e))?;

        temp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io(table, "failed to fsync temp table file", e))?;

        temp.persist(&path)
            .map_err(|e| StorageError::io(table, "failed to commit table file", e.error))?;

        if let Ok(dir) = File::open(&self.root) {
            let _ = dir.sync_all();
        }

        let count = rows.len().to_string();
        Logger::trace("TABLE_WRITTEN", &[("table", table), ("rows", count.as_str())]);

        Ok(())
    }

    /// Names of all tables with a backing file, sorted
    pub fn list_tables(&self) -> StorageResult<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io("*", "failed to list storage root", e)),
        };

        let mut tables = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io("*", "failed to list storage root", e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_table_name(stem).is_ok() {
                    tables.push(stem.to_string());
                }
            }
        }

        tables.sort();
        Ok(tables)
    }

    fn ensure_root(&self, table: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root)
            .map_err(|e| StorageError::io(table, "failed to create storage directory", e))
    }
}

/// Table names map directly to file names, so only a safe alphabet is allowed
pub fn validate_table_name(table: &str) -> StorageResult<()> {
    let valid = !table.is_empty()
        && table.len() <= MAX_TABLE_NAME_LEN
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn temp_files(dir: &TempDir) -> Vec<String> {
        fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_read_missing_table_is_empty() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());

        assert!(storage.read("topics").unwrap().is_empty());
    }

    #[test]
    fn test_root_created_lazily() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data").join("db");
        let storage = TableStorage::new(&root);
        assert!(!root.exists());

        storage.read("topics").unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());
        let rows = vec![
            row(json!({"id": "1", "name": "rust"})),
            row(json!({"id": "2", "name": "go", "tags": ["a", null]})),
        ];

        storage.write("topics", &rows).unwrap();
        assert_eq!(storage.read("topics").unwrap(), rows);
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());

        storage.write("topics", &[row(json!({"id": "1"}))]).unwrap();

        assert!(temp.path().join("topics.json").exists());
        assert!(temp_files(&temp).is_empty());
    }

    #[test]
    fn test_failed_commit_removes_temp_file() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());
        fs::create_dir(temp.path().join("topics.json")).unwrap();
        fs::write(temp.path().join("topics.json").join("keep"), b"x").unwrap();

        let err = storage.write("topics", &[row(json!({"id": "1"}))]).unwrap_err();

        assert_eq!(err.code(), StorageErrorCode::FeedStorageIoError);
        assert!(temp.path().join("topics.json").is_dir());
        assert!(temp_files(&temp).is_empty());
    }

    #[test]
    fn test_temp_files_are_not_tables() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());
        fs::write(temp.path().join("topics.a1b2c3.json.tmp"), b"[]").unwrap();

        assert!(storage.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_write_replaces_whole_image() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());

        storage
            .write("topics", &[row(json!({"id": "1"})), row(json!({"id": "2"}))])
            .unwrap();
        storage.write("topics", &[row(json!({"id": "3"}))]).unwrap();

        let rows = storage.read("topics").unwrap();
        assert_eq!(rows, vec![row(json!({"id": "3"}))]);
    }

    #[test]
    fn test_corrupt_file_reported() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());
        fs::write(temp.path().join("posts.json"), b"{not json").unwrap();

        let err = storage.read("posts").unwrap_err();
        assert_eq!(err.code(), StorageErrorCode::FeedStorageCorrupt);
    }

    #[test]
    fn test_invalid_table_names_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());

        for name in ["", "../escape", "a/b", "with space", "dot.name"] {
            let err = storage.read(name).unwrap_err();
            assert_eq!(err.code(), StorageErrorCode::FeedInvalidTable, "{}", name);
        }
        assert!(validate_table_name("digest_posts").is_ok());
        assert!(validate_table_name("source-feedback").is_ok());
    }

    #[test]
    fn test_list_tables() {
        let temp = TempDir::new().unwrap();
        let storage = TableStorage::new(temp.path());
        assert!(storage.list_tables().unwrap().is_empty());

        storage.write("topics", &[]).unwrap();
        storage.write("bookmarks", &[]).unwrap();
        fs::write(temp.path().join("notes.txt"), b"ignored").unwrap();

        assert_eq!(storage.list_tables().unwrap(), vec!["bookmarks", "topics"]);
    }
}
