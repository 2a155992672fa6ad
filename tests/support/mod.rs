//! Shared test doubles: a scripted in-memory transport and a notifier that
//! records every hook call.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::watch;

use leech::services::notifier::DownloadNotifier;
use leech::services::transport::{Transport, TransportResponse};
use leech::types::errors::TransportError;
use leech::types::notification::NotificationTarget;

/// One scripted remote resource.
#[derive(Clone)]
pub struct FakeResource {
    pub content_length: Option<u64>,
    pub chunks: Arc<Vec<Vec<u8>>>,
    /// Yield a transport error instead of the chunk at this index.
    pub fail_at: Option<usize>,
    /// Hold the body until the gate opens.
    pub gate: Option<watch::Receiver<bool>>,
    pub status: Option<u16>,
}

impl FakeResource {
    /// `total` bytes split into `chunk`-sized pieces, with a matching content length.
    pub fn bytes(total: usize, chunk: usize) -> Self {
        let data: Vec<u8> = (0..total).map(|i| (i % 251) as u8).collect();
        let chunks = data.chunks(chunk.max(1)).map(|c| c.to_vec()).collect();
        Self {
            content_length: Some(total as u64),
            chunks: Arc::new(chunks),
            fail_at: None,
            gate: None,
            status: None,
        }
    }

    pub fn content_length(mut self, len: Option<u64>) -> Self {
        self.content_length = len;
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn gated(mut self, gate: watch::Receiver<bool>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// In-memory transport serving [`FakeResource`]s by URL.
#[derive(Default)]
pub struct FakeTransport {
    resources: Mutex<HashMap<String, FakeResource>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, resource: FakeResource) {
        self.resources
            .lock()
            .unwrap()
            .insert(url.to_string(), resource);
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(
        &self,
        url: &str,
        _headers: &HashMap<String, String>,
    ) -> Result<TransportResponse, TransportError> {
        *self
            .requests
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        let resource = self
            .resources
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(TransportError::Status(404))?;

        if let Some(status) = resource.status {
            return Err(TransportError::Status(status));
        }

        let FakeResource {
            content_length,
            chunks,
            fail_at,
            gate,
            ..
        } = resource;

        let body = stream::unfold((0usize, gate), move |(index, gate)| {
            let chunks = chunks.clone();
            async move {
                if let Some(mut rx) = gate {
                    let _ = rx.wait_for(|open| *open).await;
                }
                if index == usize::MAX {
                    return None;
                }
                if fail_at == Some(index) {
                    let err = TransportError::Other("connection reset".to_string());
                    return Some((Err(err), (usize::MAX, None)));
                }
                let chunk = chunks.get(index)?.clone();
                Some((Ok(Bytes::from(chunk)), (index + 1, None)))
            }
        });

        Ok(TransportResponse {
            content_length,
            body: body.boxed(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Progress { id: i32, percent: u8 },
    Success { id: i32, total_bytes: u64 },
    Failure { id: i32 },
    CancelRequested { id: i32 },
}

#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn successes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Success { .. }))
            .count()
    }

    pub fn failures(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Failure { .. }))
            .count()
    }
}

impl DownloadNotifier for RecordingNotifier {
    fn on_progress(&self, target: &NotificationTarget, percent: u8) {
        self.calls.lock().unwrap().push(NotifierCall::Progress {
            id: target.id,
            percent,
        });
    }

    fn on_success(&self, target: &NotificationTarget, total_bytes: u64) {
        self.calls.lock().unwrap().push(NotifierCall::Success {
            id: target.id,
            total_bytes,
        });
    }

    fn on_failure(&self, target: &NotificationTarget) {
        self.calls
            .lock()
            .unwrap()
            .push(NotifierCall::Failure { id: target.id });
    }

    fn on_cancel_requested(&self, id: i32) {
        self.calls
            .lock()
            .unwrap()
            .push(NotifierCall::CancelRequested { id });
    }
}

/// Pulls items from `stream` until `done` accepts one, failing after five seconds.
pub async fn next_matching<S, T, F>(stream: &mut S, mut done: F) -> T
where
    S: Stream<Item = T> + Unpin,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(item) = stream.next().await {
            if done(&item) {
                return item;
            }
        }
        panic!("stream ended before a matching item arrived");
    })
    .await
    .expect("timed out waiting for a matching item")
}
