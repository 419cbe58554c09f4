//! OpenWeatherMap air-pollution and geocoding endpoints, called through the
//! credential fallback loop.

use crate::clients::http;
use crate::error::MonitorError;
use crate::fallback::credential_list::CredentialList;
use crate::fallback::fetcher::{FallbackFetcher, Fetched};
use crate::types::location::{LatLon, LocationMatch};
use crate::types::pollution::{AqiCategory, HourlySample};
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const PROVIDER: &str = "OpenWeatherMap";
pub const SOURCE: &str = "OpenWeatherMap API";

/// Which air-pollution endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollutionMode {
    Current,
    Forecast,
}

impl PollutionMode {
    fn path(self) -> &'static str {
        match self {
            PollutionMode::Current => "/data/2.5/air_pollution",
            PollutionMode::Forecast => "/data/2.5/air_pollution/forecast",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollutionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<ResponseCoord>,
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirPollutionEntry {
    pub dt: i64,
    pub main: AirQualityIndex,
    #[serde(default)]
    pub components: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQualityIndex {
    pub aqi: AqiCategory,
}

impl From<&AirPollutionEntry> for HourlySample {
    fn from(entry: &AirPollutionEntry) -> Self {
        HourlySample {
            timestamp: entry.dt,
            aqi_category: entry.main.aqi,
            components: entry.components.clone(),
        }
    }
}

impl AirPollutionResponse {
    pub fn samples(&self) -> Vec<HourlySample> {
        self.list.iter().map(HourlySample::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodingEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    credentials: CredentialList,
    fetcher: FallbackFetcher,
    pollution_timeout: Duration,
    geocoding_timeout: Duration,
}

impl OpenWeatherClient {
    pub fn new(
        http: Client,
        base_url: &str,
        credentials: CredentialList,
        pollution_timeout: Duration,
        geocoding_timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            fetcher: FallbackFetcher::new(PROVIDER),
            pollution_timeout,
            geocoding_timeout,
        }
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Fetches current or forecast air pollution at `location`.
    ///
    /// # Errors
    ///
    /// [`MonitorError::Fetch`] when every key fails, carrying the last key's
    /// failure; [`MonitorError::MalformedPayload`] when the successful body
    /// doesn't match the expected schema.
    pub async fn air_pollution(
        &self,
        location: LatLon,
        mode: PollutionMode,
    ) -> Result<Fetched<AirPollutionResponse>, MonitorError> {
        let url = format!("{}{}", self.base_url, mode.path());
        let coordinates = [("lat", location.0.to_string()), ("lon", location.1.to_string())];

        let fetched = self
            .fetcher
            .fetch(&self.credentials, |key| {
                let request = self
                    .http
                    .get(&url)
                    .query(&coordinates)
                    .query(&[("appid", key)])
                    .timeout(self.pollution_timeout);
                http::text(request)
            })
            .await
            .into_result()?;

        let payload: AirPollutionResponse = http::decode(PROVIDER, &fetched.value)?;
        info!(
            "Fetched {} air pollution samples ({:?}) for ({}, {})",
            payload.list.len(),
            mode,
            location.0,
            location.1
        );
        Ok(fetched.map(|_| payload))
    }

    /// Searches places by name. `country` is an ISO 3166 code appended to the
    /// query, as the geocoding API expects.
    pub async fn geocode(
        &self,
        query: &str,
        limit: u8,
        country: Option<&str>,
    ) -> Result<Fetched<Vec<LocationMatch>>, MonitorError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let q = match country.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => format!("{},{}", query.trim(), code),
            None => query.trim().to_string(),
        };
        let params = [("q", q), ("limit", limit.to_string())];

        let fetched = self
            .fetcher
            .fetch(&self.credentials, |key| {
                let request = self
                    .http
                    .get(&url)
                    .query(&params)
                    .query(&[("appid", key)])
                    .timeout(self.geocoding_timeout);
                http::text(request)
            })
            .await
            .into_result()?;

        let entries: Vec<GeocodingEntry> = http::decode(PROVIDER, &fetched.value)?;
        Ok(fetched.map(|_| {
            entries
                .into_iter()
                .map(|e| LocationMatch::new(e.name, e.lat, e.lon, e.country, e.state, country))
                .collect()
        }))
    }
}
