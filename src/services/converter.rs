//! Conversions between request data and their stored string forms.

use std::collections::HashMap;

use reqwest::Url;
use uuid::Uuid;

const FALLBACK_FILE_NAME: &str = "downloadfile.bin";

/// Serializes request headers. An empty map becomes the empty string.
pub fn headers_to_json(headers: &HashMap<String, String>) -> Result<String, serde_json::Error> {
    if headers.is_empty() {
        Ok(String::new())
    } else {
        serde_json::to_string(headers)
    }
}

/// Parses stored request headers. The empty string means "no headers".
pub fn json_to_headers(json: &str) -> Result<HashMap<String, String>, serde_json::Error> {
    if json.is_empty() {
        Ok(HashMap::new())
    } else {
        serde_json::from_str(json)
    }
}

/// Default file name for a request without one: `{uuid}-{guessed name}`.
pub fn default_file_name(url: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), guess_file_name(url))
}

/// Last non-empty path segment of `url`, or `downloadfile.bin`.
pub fn guess_file_name(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        })
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Human-readable size, e.g. `2.00 KB`.
pub fn format_file_size(total_bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = total_bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
