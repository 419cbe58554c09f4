//! The credential fallback loop shared by every keyed provider.
//!
//! Credentials are tried strictly one after another, in list order. The first
//! success ends the loop; every failure is classified, logged and recorded,
//! and the loop moves on to the next credential regardless of the failure
//! class. Nothing runs concurrently, so at most one quota unit is in flight.

use crate::fallback::credential_list::CredentialList;
use crate::fallback::error::{FailureKind, FetchError};
use log::{info, warn};
use serde::Serialize;
use std::future::Future;

/// The outcome of a single attempt, without the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed(FailureKind),
}

/// Immutable record of one credential attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAttempt {
    /// 1-based position of the credential in its [`CredentialList`].
    pub credential_index: usize,
    pub outcome: AttemptOutcome,
}

/// Everything that happened during one [`FallbackFetcher::fetch`] call.
#[derive(Debug, Clone)]
pub struct FetchResult<T> {
    /// Name of the provider the credentials belong to.
    pub provider: String,
    /// Number of credentials that were available.
    pub credential_count: usize,
    /// The payload from the first successful attempt, if any.
    pub payload: Option<T>,
    /// Every attempt, in the order made.
    pub attempts: Vec<FetchAttempt>,
}

impl<T> FetchResult<T> {
    pub fn succeeded(&self) -> bool {
        self.payload.is_some()
    }

    /// 1-based index of the credential that produced the payload.
    pub fn credential_index_used(&self) -> Option<usize> {
        self.attempts
            .iter()
            .find(|attempt| attempt.outcome == AttemptOutcome::Success)
            .map(|attempt| attempt.credential_index)
    }

    /// The classification of the most recent failed attempt.
    pub fn last_error(&self) -> Option<&FailureKind> {
        self.attempts.iter().rev().find_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Failed(kind) => Some(kind),
            AttemptOutcome::Success => None,
        })
    }

    /// Converts into the payload plus the credential index that produced it,
    /// or into [`FetchError::AllCredentialsExhausted`] carrying the last error.
    pub fn into_result(self) -> Result<Fetched<T>, FetchError> {
        let credential_index = self.credential_index_used();
        let last_error = self.last_error().cloned();
        match (self.payload, credential_index) {
            (Some(value), Some(credential_index)) => Ok(Fetched {
                value,
                credential_index,
                credential_count: self.credential_count,
            }),
            _ => Err(FetchError::AllCredentialsExhausted {
                provider: self.provider,
                attempted: self.attempts.len(),
                last_error: last_error
                    .unwrap_or(FailureKind::NetworkError("no attempt was made".to_string())),
            }),
        }
    }
}

/// A successful payload together with which credential produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    /// 1-based.
    pub credential_index: usize,
    pub credential_count: usize,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            credential_index: self.credential_index,
            credential_count: self.credential_count,
        }
    }
}

/// Runs provider calls against an ordered [`CredentialList`].
#[derive(Debug, Clone)]
pub struct FallbackFetcher {
    provider: String,
}

impl FallbackFetcher {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Tries `attempt` with each credential in order until one succeeds.
    ///
    /// The closure receives the credential and returns the provider's payload
    /// or a [`FailureKind`]. A credential is never tried twice, the list is
    /// never reordered, and a network error moves on to the next credential
    /// just like an HTTP error does.
    ///
    /// # Examples
    ///
    /// ```
    /// use air_quality_monitor::{CredentialList, FailureKind, FallbackFetcher};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let keys = CredentialList::new(["expired", "valid"]).unwrap();
    /// let result = FallbackFetcher::new("demo")
    ///     .fetch(&keys, |key| async move {
    ///         if key == "valid" { Ok(42) } else { Err(FailureKind::Unauthorized) }
    ///     })
    ///     .await;
    /// assert_eq!(result.payload, Some(42));
    /// assert_eq!(result.credential_index_used(), Some(2));
    /// # }
    /// ```
    pub async fn fetch<'a, T, F, Fut>(
        &self,
        credentials: &'a CredentialList,
        mut attempt: F,
    ) -> FetchResult<T>
    where
        F: FnMut(&'a str) -> Fut,
        Fut: Future<Output = Result<T, FailureKind>>,
    {
        let total = credentials.len();
        let mut attempts = Vec::with_capacity(total);

        for (position, credential) in credentials.iter().enumerate() {
            let credential_index = position + 1;
            match attempt(credential).await {
                Ok(payload) => {
                    info!(
                        "{}: credential {} of {} succeeded",
                        self.provider, credential_index, total
                    );
                    attempts.push(FetchAttempt {
                        credential_index,
                        outcome: AttemptOutcome::Success,
                    });
                    return FetchResult {
                        provider: self.provider.clone(),
                        credential_count: total,
                        payload: Some(payload),
                        attempts,
                    };
                }
                Err(kind) => {
                    warn!(
                        "{}: credential {} of {} failed: {}",
                        self.provider, credential_index, total, kind
                    );
                    attempts.push(FetchAttempt {
                        credential_index,
                        outcome: AttemptOutcome::Failed(kind),
                    });
                }
            }
        }

        warn!(
            "{}: all {} credentials failed, last error: {}",
            self.provider,
            total,
            attempts
                .last()
                .map(|a| match &a.outcome {
                    AttemptOutcome::Failed(kind) => kind.to_string(),
                    AttemptOutcome::Success => String::new(),
                })
                .unwrap_or_default()
        );
        FetchResult {
            provider: self.provider.clone(),
            credential_count: total,
            payload: None,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn keys(n: usize) -> CredentialList {
        CredentialList::new((1..=n).map(|i| format!("key-{i}"))).unwrap()
    }

    #[tokio::test]
    async fn test_stops_at_first_success() {
        let credentials = keys(5);
        let seen = RefCell::new(Vec::new());
        let result = FallbackFetcher::new("test")
            .fetch(&credentials, |key| {
                seen.borrow_mut().push(key.to_string());
                async move {
                    if key == "key-3" {
                        Ok("payload")
                    } else {
                        Err(FailureKind::HttpError(500))
                    }
                }
            })
            .await;

        assert!(result.succeeded());
        assert_eq!(result.credential_index_used(), Some(3));
        assert_eq!(*seen.borrow(), ["key-1", "key-2", "key-3"]);
        assert_eq!(result.attempts.len(), 3);
    }

    #[tokio::test]
    async fn test_reports_last_error_when_exhausted() {
        let credentials = keys(3);
        let result = FallbackFetcher::new("test")
            .fetch(&credentials, |key| async move {
                Err::<(), _>(match key {
                    "key-1" => FailureKind::NetworkError("reset".into()),
                    "key-2" => FailureKind::Unauthorized,
                    _ => FailureKind::RateLimited,
                })
            })
            .await;

        assert!(!result.succeeded());
        assert_eq!(result.last_error(), Some(&FailureKind::RateLimited));
        match result.into_result() {
            Err(FetchError::AllCredentialsExhausted {
                attempted,
                last_error,
                ..
            }) => {
                assert_eq!(attempted, 3);
                assert_eq!(last_error, FailureKind::RateLimited);
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_does_not_short_circuit() {
        let credentials = keys(2);
        let result = FallbackFetcher::new("test")
            .fetch(&credentials, |key| async move {
                if key == "key-1" {
                    Err(FailureKind::NetworkError("timeout".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        let fetched = result.into_result().unwrap();
        assert_eq!(fetched.value, 7);
        assert_eq!(fetched.credential_index, 2);
        assert_eq!(fetched.credential_count, 2);
    }

    #[tokio::test]
    async fn test_each_credential_tried_once() {
        let credentials = keys(4);
        let calls = RefCell::new(0usize);
        let result = FallbackFetcher::new("test")
            .fetch(&credentials, |_| {
                *calls.borrow_mut() += 1;
                async { Err::<(), _>(FailureKind::Unauthorized) }
            })
            .await;
        assert_eq!(*calls.borrow(), 4);
        let indices: Vec<_> = result.attempts.iter().map(|a| a.credential_index).collect();
        assert_eq!(indices, [1, 2, 3, 4]);
    }

    #[test]
    fn test_status_classification() {
        use reqwest::StatusCode;
        assert_eq!(
            FailureKind::from_status(StatusCode::UNAUTHORIZED),
            FailureKind::Unauthorized
        );
        assert_eq!(
            FailureKind::from_status(StatusCode::FORBIDDEN),
            FailureKind::Unauthorized
        );
        assert_eq!(
            FailureKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            FailureKind::RateLimited
        );
        assert_eq!(
            FailureKind::from_status(StatusCode::BAD_GATEWAY),
            FailureKind::HttpError(502)
        );
    }
}
