//! Response bodies of the monitor's operations. Each is wrapped in an
//! [`crate::Envelope`] before it reaches a client.

use crate::advice::generator::{AdviceSource, AdviceText};
use crate::advice::subject::SubjectCategory;
use crate::clients::daymet::ClimatePeriod;
use crate::clients::elevation::ElevationSource;
use crate::clients::open_meteo::WeatherForecast;
use crate::clients::openweather::{AirPollutionResponse, PollutionMode};
use crate::climate::parser::{ClimateRecord, ColumnSummary};
use crate::satellite::locator::QualityTier;
use crate::types::gas::GasType;
use crate::types::location::{Coordinates, LocationMatch};
use crate::types::pollution::{AqiCategory, DailyAggregate};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollutionReport {
    pub coordinates: Coordinates,
    pub mode: PollutionMode,
    pub data: AirPollutionResponse,
    pub source: &'static str,
    /// 1-based index of the API key that answered.
    pub credential_index_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecastReport {
    pub coordinates: Coordinates,
    pub daily_forecast: Vec<DailyAggregate>,
    pub raw_sample_count: usize,
    pub source: &'static str,
    pub credential_index_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSearchReport {
    pub query: String,
    pub count: usize,
    pub results: Vec<LocationMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherForecastReport {
    pub coordinates: Coordinates,
    pub forecast: WeatherForecast,
    pub source: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteGasReport {
    pub gas_type: GasType,
    pub gas_name: &'static str,
    pub location: Coordinates,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Day the granule was found for, at or before `end_date`.
    pub data_date: NaiveDate,
    pub granule: String,
    /// Nearest valid column value divided by 10 000.
    pub tropospheric_column_density: f64,
    /// Unit declared by the granule for the undivided value.
    pub column_unit: String,
    /// `tropospheric_column_density` × elevation.
    pub estimated_volume: f64,
    pub elevation_m: f64,
    pub elevation_source: ElevationSource,
    /// Cells that passed the quality and validity filters.
    pub quality_points_used: usize,
    pub quality_tier: QualityTier,
    pub nearest_point: Coordinates,
    /// Degree-space distance to `nearest_point`.
    pub distance_deg: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateParameters {
    pub variables: Vec<String>,
    pub period: ClimatePeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateReport {
    pub location: Coordinates,
    pub metadata: BTreeMap<String, String>,
    pub units: BTreeMap<String, String>,
    pub parameters: ClimateParameters,
    /// Rows parsed, before truncation.
    pub data_count: usize,
    pub summary_statistics: BTreeMap<String, ColumnSummary>,
    /// At most the configured row cap.
    pub daily_data: Vec<ClimateRecord>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceReport {
    pub aqi_category: AqiCategory,
    pub risk_group: String,
    pub subject_category: SubjectCategory,
    pub advice_text: String,
    pub bullets: Vec<String>,
    pub source_tag: AdviceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl AdviceReport {
    pub fn new(
        aqi_category: AqiCategory,
        risk_group: String,
        subject_category: SubjectCategory,
        advice: AdviceText,
    ) -> Self {
        Self {
            aqi_category,
            risk_group,
            subject_category,
            advice_text: advice.text,
            bullets: advice.bullets,
            source_tag: advice.source,
            generator: advice.generator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    pub name: &'static str,
    pub route: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub operations: Vec<OperationInfo>,
}
