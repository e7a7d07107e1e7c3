//! Store Persistence Tests
//!
//! Durability and file-format behavior:
//! - every write rewrites `<root>/<table>.json` as a JSON array
//! - data survives reopening the store
//! - undecodable files are reported, never silently replaced
//! - concurrent writers through one store lose no rows
//! - independent handles on one root never expose a torn table

use std::fs;
use std::thread;

use feedstore::storage::TableStorage;
use feedstore::{Store, StoreConfig};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn temp_files(dir: &TempDir) -> Vec<String> {
    fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect()
}

fn read_table_file(dir: &TempDir, table: &str) -> Value {
    let content = fs::read_to_string(dir.path().join(format!("{}.json", table))).unwrap();
    serde_json::from_str(&content).unwrap()
}

// =============================================================================
// File Format
// =============================================================================

#[test]
fn test_table_file_is_json_array_of_rows() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());

    store
        .from("topics")
        .insert(json!({"name": "rust", "sort_order": 1}))
        .execute();

    let file = read_table_file(&temp_dir, "topics");
    let rows = file.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "rust");
    assert!(rows[0]["id"].is_string());
    assert!(rows[0]["created_at"].is_string());
}

#[test]
fn test_write_leaves_no_temp_file() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());

    store.from("topics").insert(json!({"name": "a"})).execute();
    store.from("topics").update(json!({"name": "b"})).execute();

    assert!(temp_files(&temp_dir).is_empty());
}

#[test]
fn test_compact_codec_from_config() {
    let temp_dir = create_temp_data_dir();
    let mut config = StoreConfig::with_data_dir(temp_dir.path().to_str().unwrap());
    config.pretty = false;
    let store = Store::from_config(&config);

    store.from("topics").insert(json!({"name": "a"})).execute();

    let content = fs::read_to_string(temp_dir.path().join("topics.json")).unwrap();
    assert!(!content.contains('\n'));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_rows_survive_reopen() {
    let temp_dir = create_temp_data_dir();

    let id = {
        let store = Store::open(temp_dir.path());
        let created = store
            .from("bookmarks")
            .insert(json!({"feed_item_id": "f1"}))
            .select("id")
            .single()
            .execute();
        created.data["id"].as_str().unwrap().to_string()
    };

    let reopened = Store::open(temp_dir.path());
    let found = reopened
        .from("bookmarks")
        .eq("id", id.as_str())
        .single()
        .execute();
    assert_eq!(found.data["feed_item_id"], "f1");
}

#[test]
fn test_hand_written_file_is_readable() {
    let temp_dir = create_temp_data_dir();
    fs::write(
        temp_dir.path().join("topics.json"),
        r#"[{"id": "t1", "name": "seeded", "sort_order": 3}]"#,
    )
    .unwrap();

    let store = Store::open(temp_dir.path());
    let result = store.from("topics").select("name").execute();
    assert_eq!(result.data, json!([{"name": "seeded"}]));
}

#[test]
fn test_list_tables_after_writes() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());
    assert!(store.list_tables().unwrap().is_empty());

    store.from("topics").insert(json!({"name": "a"})).execute();
    store.from("feed_items").insert(json!({"title": "b"})).execute();
    fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

    assert_eq!(store.list_tables().unwrap(), vec!["feed_items", "topics"]);
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_corrupt_file_is_reported_on_select() {
    let temp_dir = create_temp_data_dir();
    fs::write(temp_dir.path().join("topics.json"), "[{\"id\": ").unwrap();

    let store = Store::open(temp_dir.path());
    let result = store.from("topics").execute();

    let error = result.error.expect("expected corruption error");
    assert_eq!(error.code, "FEED_STORAGE_CORRUPT");
    assert!(result.data.is_null());
}

#[test]
fn test_corrupt_file_is_not_overwritten_by_insert() {
    let temp_dir = create_temp_data_dir();
    let path = temp_dir.path().join("topics.json");
    fs::write(&path, "{\"not\": \"an array\"}").unwrap();

    let store = Store::open(temp_dir.path());
    let result = store.from("topics").insert(json!({"name": "a"})).execute();

    assert_eq!(result.error.unwrap().code, "FEED_STORAGE_CORRUPT");
    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"not\": \"an array\"}");
}

#[test]
fn test_write_fault_is_reported_and_leaves_no_residue() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());
    store.from("bookmarks").insert(json!({"note": "keep"})).execute();
    let bookmarks_before = fs::read(temp_dir.path().join("bookmarks.json")).unwrap();

    // A directory where the table file belongs cannot be read or replaced
    let blocked = temp_dir.path().join("topics.json");
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("inner"), "untouched").unwrap();

    let insert = store.from("topics").insert(json!({"name": "a"})).execute();
    let error = insert.error.expect("expected I/O error");
    assert_eq!(error.code, "FEED_STORAGE_IO_ERROR");
    assert!(insert.data.is_null());

    let storage = TableStorage::new(temp_dir.path());
    let err = storage.write("topics", &[]).unwrap_err();
    assert_eq!(err.code().code(), "FEED_STORAGE_IO_ERROR");

    assert!(blocked.is_dir());
    assert_eq!(fs::read_to_string(blocked.join("inner")).unwrap(), "untouched");
    assert_eq!(
        fs::read(temp_dir.path().join("bookmarks.json")).unwrap(),
        bookmarks_before
    );
    assert!(temp_files(&temp_dir).is_empty());
    assert_eq!(store.metrics().queries_failed(), 1);
}

#[test]
fn test_storage_rejects_path_like_table_names() {
    let temp_dir = create_temp_data_dir();
    let storage = TableStorage::new(temp_dir.path());

    let err = storage.read("../outside").unwrap_err();
    assert_eq!(err.code().code(), "FEED_INVALID_TABLE");
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_inserts_lose_no_rows() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    let result = store
                        .from("events")
                        .insert(json!({"worker": worker, "seq": i}))
                        .execute();
                    assert!(result.is_ok());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let rows = read_table_file(&temp_dir, "events");
    assert_eq!(rows.as_array().unwrap().len(), 80);
    assert_eq!(store.metrics().queries_executed(), 80);
}

#[test]
fn test_independent_handles_never_expose_torn_tables() {
    let temp_dir = create_temp_data_dir();
    let first = Store::open(temp_dir.path());
    let second = Store::open(temp_dir.path());
    let reader = Store::open(temp_dir.path());

    // Large rows keep each write in flight long enough to overlap
    let body = "x".repeat(20 * 1024);

    let writers: Vec<_> = [first, second]
        .into_iter()
        .enumerate()
        .map(|(worker, store)| {
            let body = body.clone();
            thread::spawn(move || {
                let mut failures = Vec::new();
                for i in 0..100 {
                    let result = store
                        .from("t")
                        .upsert(
                            json!({"id": "shared", "worker": worker, "seq": i, "body": body}),
                            None,
                        )
                        .execute();
                    if let Some(error) = result.error {
                        failures.push(error.to_string());
                    }
                }
                failures
            })
        })
        .collect();

    let read_handle = thread::spawn(move || {
        let mut failures = Vec::new();
        for _ in 0..200 {
            let result = reader.from("t").execute();
            match result.error {
                Some(error) => failures.push(error.to_string()),
                None => assert!(result.data.as_array().unwrap().len() <= 2),
            }
        }
        failures
    });

    for writer in writers {
        assert_eq!(writer.join().unwrap(), Vec::<String>::new());
    }
    assert_eq!(read_handle.join().unwrap(), Vec::<String>::new());

    let rows = read_table_file(&temp_dir, "t");
    assert!(!rows.as_array().unwrap().is_empty());
    assert!(temp_files(&temp_dir).is_empty());
}

#[tokio::test]
async fn test_execute_async_round_trip() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());

    let created = store
        .from("topics")
        .insert(json!({"name": "async"}))
        .select("*")
        .single()
        .execute_async()
        .await;
    assert!(created.is_ok());

    let fetched = store
        .from("topics")
        .eq("name", "async")
        .single()
        .execute_async()
        .await;
    assert_eq!(fetched.data, created.data);
}

#[tokio::test]
async fn test_execute_async_reports_errors_in_channel() {
    let temp_dir = create_temp_data_dir();
    let store = Store::open(temp_dir.path());

    let result = store.from("no/slashes").execute_async().await;
    assert_eq!(result.error.unwrap().code, "FEED_INVALID_TABLE");
}
