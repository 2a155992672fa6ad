use thiserror::Error;

// === StoreError ===

/// Errors raised by the persistent download store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying SQLite operation failed.
    #[error("Download store database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// A stored row could not be mapped back into a record.
    #[error("Corrupt download record {id}: {reason}")]
    CorruptRecord { id: i32, reason: String },
    /// The blocking store task panicked or was cancelled.
    #[error("Download store task failed: {0}")]
    Task(String),
    /// Another thread panicked while holding the connection lock.
    #[error("Download store connection lock poisoned")]
    LockPoisoned,
}

// === TransportError ===

/// Errors raised while opening or reading a remote resource.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Invalid request header {0}")]
    InvalidHeader(String),
    /// Raised by non-HTTP transports.
    #[error("Transport error: {0}")]
    Other(String),
}

// === TransferError ===

/// Errors that terminate a single fetch attempt.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The server did not declare a strictly positive content length.
    #[error("Invalid content length")]
    InvalidContentLength,
    #[error("Transfer failed: {0}")]
    Transport(#[from] TransportError),
    #[error("Transfer I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The request headers stored on the record are not valid JSON.
    #[error("Invalid request headers: {0}")]
    Headers(String),
}

// === PayloadError ===

/// Errors decoding a background job's input.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Job payload is missing the download entity")]
    MissingEntity,
    #[error("Malformed download entity: {0}")]
    Malformed(#[from] serde_json::Error),
}

// === SettingsError ===

/// Errors related to loading and saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    IoError(String),
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
}

// === LeechError ===

/// Errors surfaced by the public [`Leech`](crate::app::Leech) facade.
#[derive(Debug, Error)]
pub enum LeechError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Failed to serialize download record: {0}")]
    Serialization(#[from] serde_json::Error),
}
