use crate::clients::http;
use crate::error::MonitorError;
use crate::types::location::LatLon;
use chrono::NaiveDate;
use log::info;
use reqwest::Client;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::time::Duration;

pub const PROVIDER: &str = "Daymet";
pub const DATASET: &str = "Daymet";

/// Latitudes covered by the single-pixel service.
pub const LATITUDE_COVERAGE: RangeInclusive<f64> = 14.5..=52.0;
/// Longitudes covered by the single-pixel service.
pub const LONGITUDE_COVERAGE: RangeInclusive<f64> = -131.0..=-53.0;

/// Whether `location` falls inside the service's coverage box.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::clients::daymet::in_coverage;
/// use air_quality_monitor::LatLon;
///
/// assert!(in_coverage(LatLon(35.96, -84.29)));
/// assert!(!in_coverage(LatLon(60.0, -100.0)));
/// ```
pub fn in_coverage(location: LatLon) -> bool {
    LATITUDE_COVERAGE.contains(&location.0) && LONGITUDE_COVERAGE.contains(&location.1)
}

/// The time span of a climate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimatePeriod {
    /// Whole calendar years. Empty means every available year.
    Years(Vec<i32>),
    DateRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClimateQuery {
    /// Variable codes such as `tmax`, `prcp`. Empty means all variables.
    pub variables: Vec<String>,
    pub period: ClimatePeriod,
}

impl ClimateQuery {
    fn query_pairs(&self, location: LatLon) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", location.0.to_string()),
            ("lon", location.1.to_string()),
        ];
        if !self.variables.is_empty() {
            pairs.push(("vars", self.variables.join(",")));
        }
        match &self.period {
            ClimatePeriod::Years(years) if !years.is_empty() => {
                let years: Vec<String> = years.iter().map(i32::to_string).collect();
                pairs.push(("years", years.join(",")));
            }
            ClimatePeriod::Years(_) => {}
            ClimatePeriod::DateRange { start, end } => {
                pairs.push(("start", start.format("%Y-%m-%d").to_string()));
                pairs.push(("end", end.format("%Y-%m-%d").to_string()));
            }
        }
        pairs
    }
}

/// Keyless single-pixel climate export service. Returns the raw CSV text.
pub struct DaymetClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl DaymetClient {
    pub fn new(http: Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Downloads the CSV export for `location`.
    ///
    /// # Errors
    ///
    /// [`MonitorError::OutOfCoverage`] before any request when `location` is
    /// outside the coverage box.
    pub async fn single_pixel(
        &self,
        location: LatLon,
        query: &ClimateQuery,
    ) -> Result<String, MonitorError> {
        if !in_coverage(location) {
            return Err(MonitorError::OutOfCoverage {
                dataset: DATASET,
                lat: location.0,
                lon: location.1,
            });
        }

        let request = self
            .http
            .get(format!("{}/single-pixel/api/data", self.base_url))
            .query(&query.query_pairs(location))
            .timeout(self.timeout);
        let body = http::text(request).await.map_err(http::upstream(PROVIDER))?;
        info!(
            "Fetched {} bytes of climate data for ({}, {})",
            body.len(),
            location.0,
            location.1
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_bounds_are_inclusive() {
        assert!(in_coverage(LatLon(14.5, -131.0)));
        assert!(in_coverage(LatLon(52.0, -53.0)));
        assert!(!in_coverage(LatLon(14.49, -100.0)));
        assert!(!in_coverage(LatLon(40.0, -52.9)));
    }

    #[test]
    fn test_query_pairs() {
        let query = ClimateQuery {
            variables: vec!["tmax".into(), "prcp".into()],
            period: ClimatePeriod::Years(vec![2020, 2021]),
        };
        let pairs = query.query_pairs(LatLon(35.5, -84.0));
        assert!(pairs.contains(&("vars", "tmax,prcp".to_string())));
        assert!(pairs.contains(&("years", "2020,2021".to_string())));

        let query = ClimateQuery {
            variables: Vec::new(),
            period: ClimatePeriod::DateRange {
                start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
            },
        };
        let pairs = query.query_pairs(LatLon(35.5, -84.0));
        assert!(pairs.contains(&("start", "2020-01-01".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "vars"));
    }
}
