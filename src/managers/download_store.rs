//! Download Store for leech.
//!
//! Durable storage for [`DownloadRecord`]s backed by SQLite, with live
//! observation: every subscriber gets the current value immediately and a
//! fresh snapshot after each committed mutation.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;

use crate::database::connection::Database;
use crate::types::download::{DownloadRecord, DownloadStatus};
use crate::types::errors::StoreError;

/// Live view of a single record; yields `None` while the record is absent.
pub type RecordStream = BoxStream<'static, Result<Option<DownloadRecord>, StoreError>>;
/// Live view of every record ordered by `queued_time` ascending.
pub type RecordListStream = BoxStream<'static, Result<Vec<DownloadRecord>, StoreError>>;

/// Trait defining the persistent download store contract.
#[async_trait]
pub trait DownloadStoreTrait: Send + Sync {
    /// Inserts a record, replacing any record with the same id.
    async fn insert(&self, record: &DownloadRecord) -> Result<(), StoreError>;
    /// Inserts `record` unless its id is already stored; returns the stored record.
    async fn insert_or_get(&self, record: &DownloadRecord) -> Result<DownloadRecord, StoreError>;
    /// Overwrites an existing record. Returns `false` if no record has that id.
    async fn update(&self, record: &DownloadRecord) -> Result<bool, StoreError>;
    async fn delete(&self, id: i32) -> Result<(), StoreError>;
    async fn delete_all(&self) -> Result<(), StoreError>;
    async fn get(&self, id: i32) -> Result<Option<DownloadRecord>, StoreError>;
    async fn get_all(&self) -> Result<Vec<DownloadRecord>, StoreError>;
    fn observe(&self, id: i32) -> RecordStream;
    fn observe_all(&self) -> RecordListStream;
}

const SELECT_COLUMNS: &str = "SELECT id, file_name, file_path, url, headers_json, file_byte_size, queued_time, download_status FROM leech_downloads";

/// SQLite-backed download store. Cheap to clone; clones share the change feed.
#[derive(Clone)]
pub struct DownloadStore {
    db: Arc<Database>,
    changes: Arc<watch::Sender<u64>>,
}

impl DownloadStore {
    pub fn new(db: Arc<Database>) -> Self {
        let (tx, _rx) = watch::channel(0u64);
        Self {
            db,
            changes: Arc::new(tx),
        }
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

/// Runs `f` against the locked connection on the blocking pool.
async fn run_blocking<T, F>(db: Arc<Database>, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let conn = db.connection()?;
        f(&conn)
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
}

fn row_to_record(row: &Row) -> rusqlite::Result<DownloadRecord> {
    let id: i32 = row.get(0)?;
    let status_str: String = row.get(7)?;
    let status = DownloadStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            Box::new(StoreError::CorruptRecord {
                id,
                reason: format!("unknown status {}", status_str),
            }),
        )
    })?;
    Ok(DownloadRecord {
        id,
        file_name: row.get(1)?,
        file_path: row.get(2)?,
        url: row.get(3)?,
        headers_json: row.get(4)?,
        byte_size: row.get::<_, i64>(5)? as u64,
        queued_time: row.get(6)?,
        status,
    })
}

fn query_one(conn: &Connection, id: i32) -> Result<Option<DownloadRecord>, StoreError> {
    let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
    Ok(conn.query_row(&sql, params![id], row_to_record).optional()?)
}

fn query_all(conn: &Connection) -> Result<Vec<DownloadRecord>, StoreError> {
    let sql = format!("{} ORDER BY queued_time ASC, id ASC", SELECT_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}

fn write_record(conn: &Connection, verb: &str, record: &DownloadRecord) -> Result<usize, StoreError> {
    let sql = format!(
        "{} INTO leech_downloads (id, file_name, file_path, url, headers_json, file_byte_size, queued_time, download_status) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        verb
    );
    Ok(conn.execute(
        &sql,
        params![
            record.id,
            record.file_name,
            record.file_path,
            record.url,
            record.headers_json,
            record.byte_size as i64,
            record.queued_time,
            record.status.as_str(),
        ],
    )?)
}

/// Builds a stream that replays `query` now and after every change,
/// skipping results equal to the previous emission.
fn observe_query<T, F, Fut>(rx: watch::Receiver<u64>, query: F) -> BoxStream<'static, Result<T, StoreError>>
where
    T: PartialEq + Clone + Send + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    struct Cursor<T, F> {
        rx: watch::Receiver<u64>,
        query: F,
        last: Option<T>,
        primed: bool,
    }

    let cursor = Cursor {
        rx,
        query,
        last: None,
        primed: false,
    };

    stream::unfold(cursor, |mut cursor| async move {
        loop {
            if cursor.primed && cursor.rx.changed().await.is_err() {
                return None;
            }
            cursor.primed = true;
            cursor.rx.borrow_and_update();

            match (cursor.query)().await {
                Ok(value) => {
                    if cursor.last.as_ref() == Some(&value) {
                        continue;
                    }
                    cursor.last = Some(value.clone());
                    return Some((Ok(value), cursor));
                }
                Err(e) => return Some((Err(e), cursor)),
            }
        }
    })
    .boxed()
}

#[async_trait]
impl DownloadStoreTrait for DownloadStore {
    async fn insert(&self, record: &DownloadRecord) -> Result<(), StoreError> {
        let record = record.clone();
        run_blocking(self.db.clone(), move |conn| {
            write_record(conn, "INSERT OR REPLACE", &record)
        })
        .await?;
        self.notify_changed();
        Ok(())
    }

    async fn insert_or_get(&self, record: &DownloadRecord) -> Result<DownloadRecord, StoreError> {
        let record = record.clone();
        let (stored, inserted) = run_blocking(self.db.clone(), move |conn| {
            if let Some(existing) = query_one(conn, record.id)? {
                return Ok((existing, false));
            }
            write_record(conn, "INSERT", &record)?;
            Ok((record, true))
        })
        .await?;
        if inserted {
            self.notify_changed();
        }
        Ok(stored)
    }

    async fn update(&self, record: &DownloadRecord) -> Result<bool, StoreError> {
        let record = record.clone();
        let changed = run_blocking(self.db.clone(), move |conn| {
            Ok(conn.execute(
                "UPDATE leech_downloads SET file_name = ?2, file_path = ?3, url = ?4, headers_json = ?5, file_byte_size = ?6, queued_time = ?7, download_status = ?8 WHERE id = ?1",
                params![
                    record.id,
                    record.file_name,
                    record.file_path,
                    record.url,
                    record.headers_json,
                    record.byte_size as i64,
                    record.queued_time,
                    record.status.as_str(),
                ],
            )?)
        })
        .await?;
        if changed > 0 {
            self.notify_changed();
        }
        Ok(changed > 0)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let removed = run_blocking(self.db.clone(), move |conn| {
            Ok(conn.execute("DELETE FROM leech_downloads WHERE id = ?1", params![id])?)
        })
        .await?;
        if removed > 0 {
            self.notify_changed();
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        run_blocking(self.db.clone(), |conn| {
            Ok(conn.execute("DELETE FROM leech_downloads", [])?)
        })
        .await?;
        self.notify_changed();
        Ok(())
    }

    async fn get(&self, id: i32) -> Result<Option<DownloadRecord>, StoreError> {
        run_blocking(self.db.clone(), move |conn| query_one(conn, id)).await
    }

    async fn get_all(&self) -> Result<Vec<DownloadRecord>, StoreError> {
        run_blocking(self.db.clone(), query_all).await
    }

    fn observe(&self, id: i32) -> RecordStream {
        let db = self.db.clone();
        observe_query(self.changes.subscribe(), move || {
            run_blocking(db.clone(), move |conn| query_one(conn, id))
        })
    }

    fn observe_all(&self) -> RecordListStream {
        let db = self.db.clone();
        observe_query(self.changes.subscribe(), move || {
            run_blocking(db.clone(), query_all)
        })
    }
}
