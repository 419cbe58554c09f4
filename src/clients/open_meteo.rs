use crate::clients::http;
use crate::error::MonitorError;
use crate::types::location::LatLon;
use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub const PROVIDER: &str = "Open-Meteo";
pub const SOURCE: &str = "Open-Meteo API";

const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,precipitation,wind_speed_10m";
const DAILY_VARIABLES: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub hourly_units: BTreeMap<String, String>,
    pub hourly: HourlySeries,
    #[serde(default)]
    pub daily_units: BTreeMap<String, String>,
    pub daily: DailySeries,
}

/// Hourly series; all vectors are aligned with `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
}

/// Keyless weather forecast provider.
pub struct OpenMeteoClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl OpenMeteoClient {
    pub fn new(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub async fn forecast(&self, location: LatLon) -> Result<WeatherForecast, MonitorError> {
        let request = self
            .http
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", location.0.to_string()),
                ("longitude", location.1.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("daily", DAILY_VARIABLES.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .timeout(self.timeout);

        let body = http::text(request).await.map_err(http::upstream(PROVIDER))?;
        let forecast: WeatherForecast = http::decode(PROVIDER, &body)?;
        info!(
            "Fetched {} hourly and {} daily forecast steps for ({}, {})",
            forecast.hourly.time.len(),
            forecast.daily.time.len(),
            location.0,
            location.1
        );
        Ok(forecast)
    }
}
