use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key holding the serialized [`DownloadRecord`](super::download::DownloadRecord).
pub const EXTRA_DOWNLOAD_ENTITY: &str = "leech_extra_download_entity";
/// Payload key holding the notification icon reference.
pub const EXTRA_NOTIFICATION_ICON: &str = "leech_extra_notification_icon";
/// Payload key holding the notification importance level.
pub const EXTRA_NOTIFICATION_IMPORTANCE: &str = "leech_extra_notification_importance";

/// Key/value input handed to a background job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobData(Map<String, Value>);

impl JobData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), Value::String(value.into()));
        self
    }

    pub fn put_int(mut self, key: &str, value: i32) -> Self {
        self.0.insert(key.to_string(), Value::from(value));
        self
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns the int stored under `key`, or `default` when missing or not an i32.
    pub fn get_int(&self, key: &str, default: i32) -> i32 {
        self.0
            .get(key)
            .and_then(Value::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What to do when a job with the same unique key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingJobPolicy {
    /// Leave the queued or running job alone and drop the new one.
    Keep,
    /// Cancel the existing job and start the new one.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Enqueued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Result a job handler reports back to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure,
}

/// Long-running indication a job publishes while it works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundInfo {
    pub notification_id: i32,
    pub title: String,
    pub progress: u8,
}
