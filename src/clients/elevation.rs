use crate::clients::http;
use crate::error::MonitorError;
use crate::types::location::LatLon;
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PROVIDER: &str = "Open-Elevation";

/// Used whenever the elevation lookup is unavailable.
pub const DEFAULT_ELEVATION_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationSource {
    Measured,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Elevation {
    pub meters: f64,
    pub source: ElevationSource,
}

impl Elevation {
    pub fn fallback() -> Self {
        Self {
            meters: DEFAULT_ELEVATION_M,
            source: ElevationSource::Default,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: f64,
}

pub struct ElevationClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl ElevationClient {
    pub fn new(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Ground elevation at `location`. Never fails: any lookup problem is
    /// logged and answered with [`DEFAULT_ELEVATION_M`].
    pub async fn elevation(&self, location: LatLon) -> Elevation {
        match self.lookup(location).await {
            Ok(meters) => Elevation {
                meters,
                source: ElevationSource::Measured,
            },
            Err(e) => {
                warn!(
                    "Elevation lookup for ({}, {}) failed ({}), using {} m",
                    location.0, location.1, e, DEFAULT_ELEVATION_M
                );
                Elevation::fallback()
            }
        }
    }

    async fn lookup(&self, location: LatLon) -> Result<f64, MonitorError> {
        let request = self
            .http
            .get(format!("{}/api/v1/lookup", self.base_url))
            .query(&[("locations", format!("{},{}", location.0, location.1))])
            .timeout(self.timeout);
        let body = http::text(request).await.map_err(http::upstream(PROVIDER))?;
        let response: LookupResponse = http::decode(PROVIDER, &body)?;
        response
            .results
            .first()
            .map(|r| r.elevation)
            .ok_or_else(|| MonitorError::NotFound(format!("no elevation for {location:?}")))
    }
}
