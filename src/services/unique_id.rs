//! Stable download identifiers.
//!
//! A download's id is a pure function of `(url, file_path, file_name)` and is
//! both the record's primary key and the job queue's uniqueness key.

use ring::digest;

/// Derives the id for a download target.
///
/// Hashes `"{url}/{file_path}/{file_name}"` with SHA-256 and folds the digest
/// as signed bytes: `acc = acc * 31 + byte`, seeded at 0, in wrapping 32-bit
/// arithmetic. The result matches ids already persisted by earlier releases.
pub fn construct_unique_id(url: &str, file_path: &str, file_name: &str) -> i32 {
    let input = format!("{}/{}/{}", url, file_path, file_name);
    let hash = digest::digest(&digest::SHA256, input.as_bytes());
    fold_digest(hash.as_ref())
}

/// The string-hash scheme used when no digest primitive was available.
///
/// `ring`'s SHA-256 cannot fail, so [`construct_unique_id`] never falls back;
/// this is exposed for reading records keyed by that scheme.
pub fn hash_code_unique_id(url: &str, file_path: &str, file_name: &str) -> i32 {
    string_hash(url)
        .wrapping_mul(31)
        .wrapping_add(string_hash(file_path))
        .wrapping_mul(31)
        .wrapping_add(string_hash(file_name))
}

fn fold_digest(bytes: &[u8]) -> i32 {
    bytes
        .iter()
        .fold(0i32, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as i8 as i32))
}

/// Polynomial hash over UTF-16 code units, `h = 31 * h + c`.
fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32))
}
