//! Terminal provider responses arrive in several shapes; this module maps
//! them onto the crate's canonical result and error contracts.

use serde_json::Value;

use crate::error::ErrorCode;

/// Result-reference fields probed directly on the `output` object
const DIRECT_URL_FIELDS: &[&str] = &["video_url", "image_url", "url"];

/// Result-reference fields probed on the first entry of `output.results`
const RESULT_ENTRY_FIELDS: &[&str] = &["url", "img_url", "video_url"];

/// Ordered (substring, code) classification table for raw provider error text
///
/// Matching is case-insensitive and first-match-wins. Substring matching is
/// brittle by nature, but providers do not expose stable codes for every
/// failure; the table produces a stable taxonomy anyway.
const ERROR_PATTERNS: &[(&str, ErrorCode)] = &[
    ("model not exist", ErrorCode::ModelNotExist),
    ("model not found", ErrorCode::ModelNotExist),
    ("model_not_found", ErrorCode::ModelNotExist),
    ("access denied", ErrorCode::AccessDenied),
    ("accessdenied", ErrorCode::AccessDenied),
    ("unauthorized", ErrorCode::AccessDenied),
    ("invalidapikey", ErrorCode::AccessDenied),
    ("timed out", ErrorCode::Timeout),
    ("timeout", ErrorCode::Timeout),
    ("network", ErrorCode::NetworkError),
    ("connection", ErrorCode::NetworkError),
];

/// Extract the result reference from a terminal `output` object
///
/// Probes the known field names in a fixed order; the first non-empty match
/// wins. Returns `None` when no known field holds a usable value, which
/// callers must treat as a fatal normalization error rather than another
/// pending cycle.
pub(crate) fn extract_result_url(output: &Value) -> Option<String> {
    for field in DIRECT_URL_FIELDS {
        if let Some(url) = non_empty_str(output.get(*field)) {
            return Some(url);
        }
    }

    let first = output.get("results").and_then(Value::as_array).and_then(|entries| entries.first())?;

    for field in RESULT_ENTRY_FIELDS {
        if let Some(url) = non_empty_str(first.get(*field)) {
            return Some(url);
        }
    }

    None
}

/// Map raw provider error text to a stable machine code
pub(crate) fn classify_error(message: &str) -> ErrorCode {
    let lowered = message.to_lowercase();

    ERROR_PATTERNS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map_or(ErrorCode::GenerationError, |(_, code)| *code)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
