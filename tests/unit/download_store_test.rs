//! Unit tests for the SQLite-backed DownloadStore and its live views.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use futures::StreamExt;
use leech::database::Database;
use leech::managers::download_store::{DownloadStore, DownloadStoreTrait};
use leech::types::download::{DownloadRecord, DownloadStatus};
use leech::types::errors::StoreError;
use support::next_matching;

fn store() -> DownloadStore {
    DownloadStore::new(Arc::new(Database::open_in_memory().unwrap()))
}

fn record(name: &str, queued_time: i64) -> DownloadRecord {
    let mut record = DownloadRecord::new("https://example.com/f", "/downloads", name, "");
    record.queued_time = queued_time;
    record
}

#[tokio::test]
async fn insert_then_get_returns_record() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();
    assert_eq!(store.get(r.id).await.unwrap(), Some(r));
}

#[tokio::test]
async fn get_missing_returns_none() {
    let store = store();
    assert_eq!(store.get(12345).await.unwrap(), None);
}

#[tokio::test]
async fn insert_replaces_same_id() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();
    let loading = r.with_progress(512, DownloadStatus::Loading);
    store.insert(&loading).await.unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all, vec![loading]);
}

#[tokio::test]
async fn insert_or_get_keeps_existing_record() {
    let store = store();
    let first = record("a.bin", 10);
    store.insert(&first).await.unwrap();

    let second = record("a.bin", 99);
    assert_eq!(first.id, second.id);
    let effective = store.insert_or_get(&second).await.unwrap();

    assert_eq!(effective, first);
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn insert_or_get_inserts_new_record() {
    let store = store();
    let r = record("a.bin", 10);
    assert_eq!(store.insert_or_get(&r).await.unwrap(), r);
    assert_eq!(store.get(r.id).await.unwrap(), Some(r));
}

#[tokio::test]
async fn update_overwrites_existing_record() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();

    let done = r.with_progress(2048, DownloadStatus::Complete);
    assert!(store.update(&done).await.unwrap());
    assert_eq!(store.get(r.id).await.unwrap(), Some(done));
}

#[tokio::test]
async fn update_never_resurrects_deleted_record() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();
    store.delete(r.id).await.unwrap();

    let loading = r.with_progress(100, DownloadStatus::Loading);
    assert!(!store.update(&loading).await.unwrap());
    assert_eq!(store.get(r.id).await.unwrap(), None);
}

#[tokio::test]
async fn get_all_orders_by_queued_time() {
    let store = store();
    let late = record("late.bin", 300);
    let early = record("early.bin", 100);
    let middle = record("middle.bin", 200);
    for r in [&late, &early, &middle] {
        store.insert(r).await.unwrap();
    }

    let names: Vec<String> = store
        .get_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.file_name)
        .collect();
    assert_eq!(names, vec!["early.bin", "middle.bin", "late.bin"]);
}

#[tokio::test]
async fn delete_missing_is_noop() {
    let store = store();
    store.delete(42).await.unwrap();
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_all_empties_store() {
    let store = store();
    store.insert(&record("a.bin", 1)).await.unwrap();
    store.insert(&record("b.bin", 2)).await.unwrap();
    store.delete_all().await.unwrap();
    assert!(store.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_status_is_reported_as_corrupt() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.connection()
        .unwrap()
        .execute(
            "INSERT INTO leech_downloads (id, file_name, file_path, url, queued_time, download_status) VALUES (3, 'a', '/d', 'u', 0, 'DOWNLOAD_PAUSED')",
            [],
        )
        .unwrap();
    let store = DownloadStore::new(db);

    let err = store.get(3).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
    assert!(err.to_string().contains("DOWNLOAD_PAUSED"));
}

#[tokio::test]
async fn observe_replays_current_value_immediately() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();

    let mut stream = store.observe(r.id);
    let first = next_matching(&mut stream, |_| true).await.unwrap();
    assert_eq!(first, Some(r));
}

#[tokio::test]
async fn observe_missing_record_yields_none_then_record() {
    let store = store();
    let r = record("a.bin", 10);

    let mut stream = store.observe(r.id);
    assert_eq!(next_matching(&mut stream, |_| true).await.unwrap(), None);

    store.insert(&r).await.unwrap();
    let seen = next_matching(&mut stream, |item| matches!(item, Ok(Some(_)))).await;
    assert_eq!(seen.unwrap(), Some(r));
}

#[tokio::test]
async fn observe_follows_status_changes() {
    let store = store();
    let r = record("a.bin", 10);
    store.insert(&r).await.unwrap();

    let mut stream = store.observe(r.id);
    next_matching(&mut stream, |_| true).await.unwrap();

    let done = r.with_progress(64, DownloadStatus::Complete);
    store.update(&done).await.unwrap();

    let seen = next_matching(&mut stream, |item| {
        matches!(item, Ok(Some(rec)) if rec.status == DownloadStatus::Complete)
    })
    .await;
    assert_eq!(seen.unwrap(), Some(done));
}

#[tokio::test]
async fn observe_skips_unchanged_values() {
    let store = store();
    let watched = record("watched.bin", 10);
    let other = record("other.bin", 20);
    store.insert(&watched).await.unwrap();

    let mut stream = store.observe(watched.id);
    next_matching(&mut stream, |_| true).await.unwrap();

    // A write to another record bumps the change feed but leaves this view untouched.
    store.insert(&other).await.unwrap();
    let loading = watched.with_progress(1, DownloadStatus::Loading);
    store.update(&loading).await.unwrap();

    let next = next_matching(&mut stream, |_| true).await.unwrap();
    assert_eq!(next, Some(loading));
}

#[tokio::test]
async fn observe_all_tracks_listing() {
    let store = store();
    let mut stream = store.observe_all();
    assert!(next_matching(&mut stream, |_| true).await.unwrap().is_empty());

    let a = record("a.bin", 1);
    let b = record("b.bin", 2);
    store.insert(&a).await.unwrap();
    store.insert(&b).await.unwrap();

    let listing = next_matching(&mut stream, |item| {
        matches!(item, Ok(list) if list.len() == 2)
    })
    .await
    .unwrap();
    assert_eq!(listing, vec![a, b]);

    store.delete_all().await.unwrap();
    let emptied = next_matching(&mut stream, |item| matches!(item, Ok(list) if list.is_empty()))
        .await
        .unwrap();
    assert!(emptied.is_empty());
}

#[tokio::test]
async fn clones_share_change_feed() {
    let store = store();
    let clone = store.clone();
    let r = record("a.bin", 10);

    let mut stream = store.observe(r.id);
    assert_eq!(stream.next().await.unwrap().unwrap(), None);

    clone.insert(&r).await.unwrap();
    let seen = next_matching(&mut stream, |item| matches!(item, Ok(Some(_)))).await;
    assert_eq!(seen.unwrap(), Some(r));
}
