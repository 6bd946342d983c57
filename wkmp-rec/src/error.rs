//! Error types for wkmp-rec
//!
//! Two layers:
//! - `ClientError`: a single external call failed. Always caught by the stage
//!   that made the call and degraded to an empty or neutral value.
//! - `RecommendationError`: the only condition surfaced from the public entry
//!   point.

use std::time::Duration;
use thiserror::Error;

/// Maximum number of characters of an upstream error body kept in messages
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Failure of one external collaborator call
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response, transport failure, or malformed response body
    #[error("{service} upstream error: {message}")]
    Upstream { service: &'static str, message: String },

    /// Call exceeded its deadline
    #[error("{service} call timed out after {after:?}")]
    Timeout { service: &'static str, after: Duration },

    /// Model output was not JSON, or JSON of the wrong shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        ClientError::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Map a reqwest error, distinguishing timeouts
    pub fn from_reqwest(service: &'static str, after: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout { service, after }
        } else {
            ClientError::upstream(service, err.to_string())
        }
    }

    /// Build an upstream error from a non-2xx status and (truncated) body
    pub fn from_status(service: &'static str, status: reqwest::StatusCode, body: &str) -> Self {
        ClientError::upstream(
            service,
            format!("status {}: {}", status, truncate_error_body(body)),
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}

/// Result type for collaborator calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Error surfaced by `RecommendationPipeline::generate_recommendations`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendationError {
    /// Fusion produced fewer aligned songs than the request can accept.
    /// Callers should suggest trying a different prompt.
    #[error("Insufficient results: found {found}, need at least {required}")]
    InsufficientResults { found: usize, required: usize },
}

fn truncate_error_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        return body.to_string();
    }
    let truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!("{}...", truncated)
}
