//! Property-based tests for the record's JSON job payload form.
//!
//! A record carried through the job payload must come back unchanged,
//! including the empty-string convention for "no headers".

use std::collections::HashMap;

use leech::services::converter::{headers_to_json, json_to_headers};
use leech::types::download::{DownloadRecord, DownloadStatus};
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = DownloadStatus> {
    prop_oneof![
        Just(DownloadStatus::Queued),
        Just(DownloadStatus::Loading),
        Just(DownloadStatus::Complete),
        Just(DownloadStatus::Failed),
    ]
}

fn arb_headers() -> impl Strategy<Value = HashMap<String, String>> {
    proptest::collection::hash_map("[A-Za-z-]{1,16}", "[ -~]{0,32}", 0..4)
}

fn arb_record() -> impl Strategy<Value = DownloadRecord> {
    (
        "https://[a-z]{3,10}\\.com/[a-z0-9/]{0,20}",
        "(/[a-z0-9]{1,8}){1,3}",
        "[a-zA-Z0-9 ._-]{1,24}",
        arb_headers(),
        any::<u32>(),
        0i64..4_102_444_800_000,
        arb_status(),
    )
        .prop_map(|(url, path, name, headers, size, queued, status)| {
            let headers_json = headers_to_json(&headers).unwrap();
            let mut record = DownloadRecord::new(&url, &path, &name, &headers_json);
            record.byte_size = size as u64;
            record.queued_time = queued;
            record.status = status;
            record
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn payload_preserves_record(record in arb_record()) {
        let json = record.to_json().unwrap();
        let decoded = DownloadRecord::from_json(&json).unwrap();
        prop_assert_eq!(&decoded, &record);

        let headers = json_to_headers(&decoded.headers_json).unwrap();
        if headers.is_empty() {
            prop_assert_eq!(decoded.headers_json.as_str(), "");
        }
    }
}

#[test]
fn payload_uses_wire_field_names() {
    let record = DownloadRecord::new("https://x.com/a", "/d", "a", "");
    let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

    for key in [
        "fileName",
        "filePath",
        "url",
        "headersJsonString",
        "fileByteSize",
        "queuedTime",
        "downloadStatus",
        "id",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["downloadStatus"], "DOWNLOAD_QUEUED");
    assert_eq!(value["headersJsonString"], "");
}

#[test]
fn payload_without_id_recomputes_it() {
    let json = r#"{"fileName":"a","filePath":"/d","url":"https://x.com/a","downloadStatus":"DOWNLOAD_FAILED"}"#;
    let record = DownloadRecord::from_json(json).unwrap();

    let fresh = DownloadRecord::new("https://x.com/a", "/d", "a", "");
    assert_eq!(record.id, fresh.id);
    assert_eq!(record.status, DownloadStatus::Failed);
    assert_eq!(record.headers_json, "");
}
