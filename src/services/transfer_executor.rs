//! Transfer Executor for leech.
//!
//! Streams one remote resource into a local file and reports progress as a
//! lazy sequence of [`TransferEvent`]s. Nothing happens until the stream is
//! polled; the first event is always `Downloading { 0, 0 }`, emitted before
//! any network activity. Progress is time-throttled and the sequence ends
//! with exactly one `Success` or `Error`. A failed or abandoned transfer
//! never leaves a partial file behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::services::transport::Transport;
use crate::types::errors::{TransferError, TransportError};
use crate::types::settings::TransferSettings;
use crate::types::transfer::TransferEvent;

/// Drives single-attempt fetches through a [`Transport`].
#[derive(Clone)]
pub struct TransferExecutor {
    transport: Arc<dyn Transport>,
    progress_interval: Duration,
    buffer_size: usize,
}

impl TransferExecutor {
    pub fn new(transport: Arc<dyn Transport>, settings: &TransferSettings) -> Self {
        Self {
            transport,
            progress_interval: Duration::from_millis(settings.progress_interval_ms),
            buffer_size: settings.buffer_size.max(1),
        }
    }

    /// Returns the event sequence for fetching `url` into `destination`.
    ///
    /// Not resumable: every call starts again from byte 0 and truncates
    /// whatever is at `destination`.
    pub fn fetch(
        &self,
        destination: PathBuf,
        url: String,
        headers: HashMap<String, String>,
    ) -> BoxStream<'static, TransferEvent> {
        let request = FetchRequest {
            transport: self.transport.clone(),
            destination,
            url,
            headers,
            progress_interval: self.progress_interval,
            buffer_size: self.buffer_size,
        };

        stream::unfold(FetchState::Start(request), |state| async move {
            match state {
                FetchState::Start(request) => Some((
                    TransferEvent::Downloading { progress: 0, bytes: 0 },
                    FetchState::Connect(request),
                )),
                FetchState::Connect(request) => {
                    let destination = request.destination.clone();
                    match ActiveTransfer::open(request).await {
                        Ok(active) => Some(active.advance().await),
                        Err(e) => Some(fail(&destination, e).await),
                    }
                }
                FetchState::Transferring(active) => Some(active.advance().await),
                FetchState::Done => None,
            }
        })
        .boxed()
    }
}

struct FetchRequest {
    transport: Arc<dyn Transport>,
    destination: PathBuf,
    url: String,
    headers: HashMap<String, String>,
    progress_interval: Duration,
    buffer_size: usize,
}

enum FetchState {
    Start(FetchRequest),
    Connect(FetchRequest),
    Transferring(Box<ActiveTransfer>),
    Done,
}

/// Removes the destination file on drop unless the transfer completed.
///
/// Covers the case where the consuming job is aborted mid-transfer and the
/// stream is dropped without reaching a terminal event.
struct PartialFileGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "removed partial file of abandoned transfer"),
                Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove partial file"),
            }
        }
    }
}

struct ActiveTransfer {
    body: BoxStream<'static, Result<Bytes, TransportError>>,
    writer: BufWriter<File>,
    guard: PartialFileGuard,
    total_bytes: u64,
    written: u64,
    last_emit: Instant,
    progress_interval: Duration,
}

impl ActiveTransfer {
    async fn open(request: FetchRequest) -> Result<Box<Self>, TransferError> {
        let response = request
            .transport
            .get(&request.url, &request.headers)
            .await?;

        let total_bytes = match response.content_length {
            Some(len) if len > 0 => len,
            _ => return Err(TransferError::InvalidContentLength),
        };

        if let Some(parent) = request.destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = File::create(&request.destination).await?;
        info!(url = %request.url, total_bytes, path = %request.destination.display(), "transfer started");

        Ok(Box::new(Self {
            body: response.body,
            writer: BufWriter::with_capacity(request.buffer_size, file),
            guard: PartialFileGuard::new(request.destination),
            total_bytes,
            written: 0,
            last_emit: Instant::now(),
            progress_interval: request.progress_interval,
        }))
    }

    fn progress(&self) -> u8 {
        (self.written.saturating_mul(100) / self.total_bytes).min(100) as u8
    }

    /// Consumes chunks until the throttle allows a progress event or the
    /// body ends.
    async fn advance(mut self: Box<Self>) -> (TransferEvent, FetchState) {
        loop {
            match self.body.next().await {
                Some(Ok(chunk)) => {
                    if let Err(e) = self.writer.write_all(&chunk).await {
                        return self.abort(e.into()).await;
                    }
                    self.written += chunk.len() as u64;

                    let now = Instant::now();
                    if now.duration_since(self.last_emit) >= self.progress_interval {
                        self.last_emit = now;
                        let event = TransferEvent::Downloading {
                            progress: self.progress(),
                            bytes: self.written,
                        };
                        return (event, FetchState::Transferring(self));
                    }
                }
                Some(Err(e)) => return self.abort(e.into()).await,
                None => {
                    if let Err(e) = self.writer.flush().await {
                        return self.abort(e.into()).await;
                    }
                    self.guard.disarm();
                    info!(path = %self.guard.path.display(), bytes = self.written, "transfer complete");
                    return (
                        TransferEvent::Success {
                            total_bytes: self.total_bytes,
                        },
                        FetchState::Done,
                    );
                }
            }
        }
    }

    async fn abort(self: Box<Self>, error: TransferError) -> (TransferEvent, FetchState) {
        let ActiveTransfer {
            writer, mut guard, ..
        } = *self;
        drop(writer);
        guard.disarm();
        fail(&guard.path, error).await
    }
}

/// Deletes whatever was written to `destination` and yields the terminal error.
async fn fail(destination: &Path, error: TransferError) -> (TransferEvent, FetchState) {
    warn!(path = %destination.display(), error = %error, "transfer failed");
    if tokio::fs::try_exists(destination).await.unwrap_or(false) {
        if let Err(e) = tokio::fs::remove_file(destination).await {
            warn!(path = %destination.display(), error = %e, "failed to remove partial file");
        }
    }
    (TransferEvent::Error(error), FetchState::Done)
}
