use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Classification of a single failed provider call.
///
/// Every failed attempt is reduced to one of these variants so callers can
/// tell an expired key apart from an exhausted quota or an outage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    /// The credential was rejected (HTTP 401/403).
    Unauthorized,
    /// The credential's quota is used up (HTTP 429). Another credential may work.
    RateLimited,
    /// Any other non-2xx status.
    HttpError(u16),
    /// Transport-level failure: timeout, DNS, refused or reset connection.
    NetworkError(String),
}

impl FailureKind {
    /// Maps a non-success HTTP status onto a failure class.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => FailureKind::Unauthorized,
            429 => FailureKind::RateLimited,
            code => FailureKind::HttpError(code),
        }
    }

    /// Classifies a `reqwest` error. Errors carrying a status are HTTP failures,
    /// everything else (timeouts included) is a network failure.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        match error.status() {
            Some(status) => Self::from_status(status),
            None => FailureKind::NetworkError(describe_transport_error(error)),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unauthorized => write!(f, "unauthorized (invalid or expired credential)"),
            FailureKind::RateLimited => write!(f, "rate limited (quota exceeded)"),
            FailureKind::HttpError(code) => write!(f, "HTTP error {code}"),
            FailureKind::NetworkError(message) => write!(f, "network error: {message}"),
        }
    }
}

// Query strings carry API keys, so the error's own message (which embeds the
// URL) is never kept.
fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else if error.is_body() || error.is_decode() {
        "response body could not be read".to_string()
    } else {
        "request failed".to_string()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("At least one credential is required")]
    EmptyCredentialList,

    #[error("All {attempted} credentials failed for {provider}, last error: {last_error}")]
    AllCredentialsExhausted {
        provider: String,
        attempted: usize,
        last_error: FailureKind,
    },
}
