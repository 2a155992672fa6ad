use serde::{Deserialize, Serialize};

use super::notification::NotificationImportance;

/// Top-level configuration for a [`Leech`](crate::app::Leech) instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeechSettings {
    pub database_path: String,
    pub log_level: String,
    pub notification: NotificationSettings,
    pub transfer: TransferSettings,
    pub queue: QueueSettings,
}

impl Default for LeechSettings {
    fn default() -> Self {
        Self {
            database_path: "leech.db".to_string(),
            log_level: "info".to_string(),
            notification: NotificationSettings::default(),
            transfer: TransferSettings::default(),
            queue: QueueSettings::default(),
        }
    }
}

/// Presentation hints forwarded to the notification layer through the job payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotificationSettings {
    pub icon: i32,
    pub importance: NotificationImportance,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            icon: -1,
            importance: NotificationImportance::Default,
        }
    }
}

/// Streaming transfer tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransferSettings {
    /// Minimum wall-clock gap between two progress events.
    pub progress_interval_ms: u64,
    /// Write buffer size for the destination file.
    pub buffer_size: usize,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            buffer_size: 8192,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueSettings {
    pub max_concurrent_jobs: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 4,
        }
    }
}
