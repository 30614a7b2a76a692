//! Record identifier sanitization for index primary keys.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum primary key length accepted by Meilisearch, in bytes.
pub const MAX_KEY_BYTES: usize = 511;
/// Bytes kept free below [`MAX_KEY_BYTES`] for suffixes appended by callers.
pub const RESERVED_SUFFIX_BYTES: usize = 9;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("static identifier pattern"));

/// Normalize a raw record identifier into the index key alphabet.
///
/// The value is lower-cased, every character outside `[a-z0-9_-]` becomes `_`, and the result is
/// truncated to `max_bytes - RESERVED_SUFFIX_BYTES` bytes.
pub fn sanitize_identifier(raw: &str, max_bytes: usize) -> String {
    let lowered = raw.to_lowercase();
    let mut cleaned = DISALLOWED.replace_all(&lowered, "_").into_owned();
    let budget = max_bytes.saturating_sub(RESERVED_SUFFIX_BYTES);
    if cleaned.len() > budget {
        tracing::warn!(
            raw_bytes = raw.len(),
            kept_bytes = budget,
            "Identifier truncated to the index key limit; keys sharing this prefix collide"
        );
    }
    // Every remaining character is ASCII, so any byte offset is a char boundary.
    cleaned.truncate(budget);
    cleaned
}

/// Sanitize with the default Meilisearch key limit.
pub fn sanitize_record_id(raw: &str) -> String {
    sanitize_identifier(raw, MAX_KEY_BYTES)
}
