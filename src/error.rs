use crate::climate::error::ClimateError;
use crate::config::ConfigError;
use crate::fallback::error::{FailureKind, FetchError};
use crate::satellite::error::SatelliteError;
use crate::storage::StoreError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Satellite(#[from] SatelliteError),

    #[error(transparent)]
    Climate(#[from] ClimateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{provider} request failed: {failure}")]
    Upstream {
        provider: String,
        failure: FailureKind,
    },

    #[error("Unexpected payload from {provider}")]
    MalformedPayload {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("({lat}, {lon}) is outside the coverage of {dataset}")]
    OutOfCoverage {
        dataset: &'static str,
        lat: f64,
        lon: f64,
    },

    #[error("No data found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine data directory")]
    DataDirResolution,

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Machine-readable error classes exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthFailure,
    QuotaExceeded,
    UpstreamHttpError,
    NetworkFailure,
    NotFound,
    OutOfCoverage,
    MalformedUpstreamPayload,
    AllCredentialsExhausted,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Status code the HTTP layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::AllCredentialsExhausted => 503,
            ErrorKind::NotFound => 404,
            ErrorKind::OutOfCoverage | ErrorKind::InvalidInput => 422,
            ErrorKind::AuthFailure
            | ErrorKind::QuotaExceeded
            | ErrorKind::UpstreamHttpError
            | ErrorKind::NetworkFailure
            | ErrorKind::MalformedUpstreamPayload => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl From<&FailureKind> for ErrorKind {
    fn from(value: &FailureKind) -> Self {
        match value {
            FailureKind::Unauthorized => ErrorKind::AuthFailure,
            FailureKind::RateLimited => ErrorKind::QuotaExceeded,
            FailureKind::HttpError(_) => ErrorKind::UpstreamHttpError,
            FailureKind::NetworkError(_) => ErrorKind::NetworkFailure,
        }
    }
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Fetch(FetchError::AllCredentialsExhausted { .. }) => {
                ErrorKind::AllCredentialsExhausted
            }
            MonitorError::Fetch(FetchError::EmptyCredentialList) => ErrorKind::Internal,
            MonitorError::Satellite(error) => match error {
                SatelliteError::NoQualifyingPoints
                | SatelliteError::NoValidMeasurements
                | SatelliteError::NoGranules { .. } => ErrorKind::NotFound,
                SatelliteError::ShapeMismatch(_)
                | SatelliteError::MissingDownloadLink(_)
                | SatelliteError::GranuleDecode { .. } => ErrorKind::MalformedUpstreamPayload,
                SatelliteError::GranuleWrite(..) => ErrorKind::Internal,
            },
            MonitorError::Climate(_) => ErrorKind::MalformedUpstreamPayload,
            MonitorError::Config(_) => ErrorKind::Internal,
            MonitorError::Upstream { failure, .. } => ErrorKind::from(failure),
            MonitorError::MalformedPayload { .. } => ErrorKind::MalformedUpstreamPayload,
            MonitorError::OutOfCoverage { .. } => ErrorKind::OutOfCoverage,
            MonitorError::NotFound(_) => ErrorKind::NotFound,
            MonitorError::InvalidInput(_) | MonitorError::Store(_) => ErrorKind::InvalidInput,
            MonitorError::DataDirCreation(..)
            | MonitorError::DataDirResolution
            | MonitorError::TaskJoin(_) => ErrorKind::Internal,
        }
    }

    /// The last classified credential failure, for exhausted fetches.
    pub fn last_error(&self) -> Option<&FailureKind> {
        match self {
            MonitorError::Fetch(FetchError::AllCredentialsExhausted { last_error, .. }) => {
                Some(last_error)
            }
            MonitorError::Upstream { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
