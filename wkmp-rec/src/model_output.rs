//! Structured payload extraction from free-text model output
//!
//! Accepted grammar (surrounding whitespace ignored):
//!
//! ```text
//! payload := fence-open? json-value fence-close?
//! fence-open := "```" language-tag? newline
//! fence-close := "```"
//! ```
//!
//! Anything else is a `ClientError::Parse`.

use crate::error::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

/// Strip optional code-fence markers and return the inner text
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        // Drop the language tag (e.g. "json") up to the first newline
        body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

/// Parse model output into a JSON value
pub fn extract_json_payload(text: &str) -> ClientResult<Value> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(ClientError::Parse("model returned an empty payload".to_string()));
    }
    serde_json::from_str(body).map_err(|e| ClientError::Parse(format!("invalid JSON payload: {}", e)))
}

/// Parse model output into a typed value
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> ClientResult<T> {
    let value = extract_json_payload(text)?;
    serde_json::from_value(value)
        .map_err(|e| ClientError::Parse(format!("payload does not match expected schema: {}", e)))
}
