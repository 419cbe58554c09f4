//! The uniform success/failure wrapper every operation result goes through.

use crate::error::{ErrorKind, MonitorError};
use crate::fallback::error::{FailureKind, FetchError};
use serde::Serialize;

/// Machine-readable failure description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    /// Credentials tried, for exhausted fetches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<FailureKind>,
}

impl From<&MonitorError> for ErrorBody {
    fn from(error: &MonitorError) -> Self {
        let attempts = match error {
            MonitorError::Fetch(FetchError::AllCredentialsExhausted { attempted, .. }) => {
                Some(*attempted)
            }
            _ => None,
        };
        Self {
            kind: error.kind(),
            message: error.to_string(),
            attempts,
            last_error: error.last_error().cloned(),
        }
    }
}

/// `{"success": true, ...report fields}` or `{"success": false, "error": {...}}`.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::{Envelope, MonitorError};
///
/// let failed: Envelope<()> = Envelope::from_result(Err(MonitorError::NotFound("no data".into())));
/// assert!(!failed.success);
/// assert_eq!(failed.http_status(), 404);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &MonitorError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody::from(error)),
        }
    }

    pub fn from_result(result: Result<T, MonitorError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }

    /// Status code for the HTTP layer.
    pub fn http_status(&self) -> u16 {
        self.error.as_ref().map_or(200, |e| e.kind.http_status())
    }
}
