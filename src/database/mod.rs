//! SQLite backing for the download store.
//!
//! A single [`Database`] holds the `leech_downloads` table. It is opened once
//! per process, migrated on open, and shared behind an `Arc` by
//! [`DownloadStore`](crate::managers::download_store::DownloadStore), which
//! runs every statement on the blocking pool.
//!
//! ```no_run
//! use std::sync::Arc;
//! use leech::database::Database;
//! use leech::managers::download_store::DownloadStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = DownloadStore::new(Arc::new(Database::open("leech.db")?));
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
