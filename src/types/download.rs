use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::services::converter;
use crate::services::unique_id::construct_unique_id;

/// Lifecycle status of a download record.
///
/// Serialized with the `DOWNLOAD_*` names used both in the job payload and
/// in the `leech_downloads.download_status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadStatus {
    #[serde(rename = "DOWNLOAD_QUEUED")]
    Queued,
    #[serde(rename = "DOWNLOAD_LOADING")]
    Loading,
    #[serde(rename = "DOWNLOAD_COMPLETE")]
    Complete,
    #[serde(rename = "DOWNLOAD_FAILED")]
    Failed,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Queued => "DOWNLOAD_QUEUED",
            DownloadStatus::Loading => "DOWNLOAD_LOADING",
            DownloadStatus::Complete => "DOWNLOAD_COMPLETE",
            DownloadStatus::Failed => "DOWNLOAD_FAILED",
        }
    }

    /// Parses a stored status name. Unknown names map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DOWNLOAD_QUEUED" => Some(DownloadStatus::Queued),
            "DOWNLOAD_LOADING" => Some(DownloadStatus::Loading),
            "DOWNLOAD_COMPLETE" => Some(DownloadStatus::Complete),
            "DOWNLOAD_FAILED" => Some(DownloadStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Complete | DownloadStatus::Failed)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted description of one download.
///
/// `id` is derived from `(url, file_path, file_name)` and doubles as the
/// job queue key, so two records with the same triple always collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DownloadRecordWire")]
pub struct DownloadRecord {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub url: String,
    #[serde(rename = "headersJsonString")]
    pub headers_json: String,
    #[serde(rename = "fileByteSize")]
    pub byte_size: u64,
    #[serde(rename = "queuedTime")]
    pub queued_time: i64,
    #[serde(rename = "downloadStatus")]
    pub status: DownloadStatus,
    pub id: i32,
}

/// Lenient wire shape: every field is optional and the id is recomputed
/// from the identity triple when absent.
#[derive(Deserialize)]
struct DownloadRecordWire {
    #[serde(rename = "fileName", default)]
    file_name: String,
    #[serde(rename = "filePath", default)]
    file_path: String,
    #[serde(default)]
    url: String,
    #[serde(rename = "headersJsonString", default)]
    headers_json: String,
    #[serde(rename = "fileByteSize", default)]
    byte_size: u64,
    #[serde(rename = "queuedTime")]
    queued_time: Option<i64>,
    #[serde(rename = "downloadStatus")]
    status: Option<DownloadStatus>,
    id: Option<i32>,
}

impl From<DownloadRecordWire> for DownloadRecord {
    fn from(w: DownloadRecordWire) -> Self {
        let id = w
            .id
            .unwrap_or_else(|| construct_unique_id(&w.url, &w.file_path, &w.file_name));
        Self {
            file_name: w.file_name,
            file_path: w.file_path,
            url: w.url,
            headers_json: w.headers_json,
            byte_size: w.byte_size,
            queued_time: w.queued_time.unwrap_or_else(now_millis),
            status: w.status.unwrap_or(DownloadStatus::Queued),
            id,
        }
    }
}

impl DownloadRecord {
    /// Creates a fresh `QUEUED` record stamped with the current time.
    pub fn new(url: &str, file_path: &str, file_name: &str, headers_json: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            url: url.to_string(),
            headers_json: headers_json.to_string(),
            byte_size: 0,
            queued_time: now_millis(),
            status: DownloadStatus::Queued,
            id: construct_unique_id(url, file_path, file_name),
        }
    }

    /// Full path of the file this record writes to.
    pub fn destination(&self) -> PathBuf {
        PathBuf::from(&self.file_path).join(&self.file_name)
    }

    pub fn headers(&self) -> Result<HashMap<String, String>, serde_json::Error> {
        converter::json_to_headers(&self.headers_json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Copy of this record with new progress fields; identity is untouched.
    pub fn with_progress(&self, byte_size: u64, status: DownloadStatus) -> Self {
        Self {
            byte_size,
            status,
            ..self.clone()
        }
    }
}

/// A caller-supplied download request.
#[derive(Debug, Clone, Default)]
pub struct DownloadRequest {
    pub url: String,
    pub file_path: String,
    pub file_name: Option<String>,
    pub headers: HashMap<String, String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Resolves defaults and builds the record this request describes.
    pub fn into_record(self) -> Result<DownloadRecord, serde_json::Error> {
        let file_name = match self.file_name {
            Some(name) => name,
            None => converter::default_file_name(&self.url),
        };
        let headers_json = converter::headers_to_json(&self.headers)?;
        Ok(DownloadRecord::new(
            &self.url,
            &self.file_path,
            &file_name,
            &headers_json,
        ))
    }
}

/// Milliseconds since the UNIX epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
