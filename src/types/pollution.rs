//! Air-pollution samples as reported by the provider and the per-day
//! aggregates derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The 1–5 severity bucket used by the pollution provider.
///
/// This is not the continuous US EPA AQI scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AqiCategory {
    Good = 1,
    Fair = 2,
    Moderate = 3,
    Poor = 4,
    VeryPoor = 5,
}

impl AqiCategory {
    /// Converts a raw category value, returning `None` outside 1–5.
    ///
    /// # Examples
    ///
    /// ```
    /// use air_quality_monitor::AqiCategory;
    ///
    /// assert_eq!(AqiCategory::from_u8(3), Some(AqiCategory::Moderate));
    /// assert_eq!(AqiCategory::from_u8(0), None);
    /// ```
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AqiCategory::Good),
            2 => Some(AqiCategory::Fair),
            3 => Some(AqiCategory::Moderate),
            4 => Some(AqiCategory::Poor),
            5 => Some(AqiCategory::VeryPoor),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Fair => "Fair",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
        }
    }
}

impl TryFrom<u8> for AqiCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        AqiCategory::from_u8(value).ok_or_else(|| format!("AQI category must be 1-5, got {value}"))
    }
}

impl From<AqiCategory> for u8 {
    fn from(value: AqiCategory) -> Self {
        value.value()
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value(), self.label())
    }
}

/// The canonical pollutant set averaged by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pollutant {
    Co,
    No,
    No2,
    O3,
    So2,
    Pm2_5,
    Pm10,
    Nh3,
}

impl Pollutant {
    pub const ALL: [Pollutant; 8] = [
        Pollutant::Co,
        Pollutant::No,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Pm2_5,
        Pollutant::Pm10,
        Pollutant::Nh3,
    ];

    /// Key used by the provider payload and in aggregate output.
    pub fn key(self) -> &'static str {
        match self {
            Pollutant::Co => "co",
            Pollutant::No => "no",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
            Pollutant::So2 => "so2",
            Pollutant::Pm2_5 => "pm2_5",
            Pollutant::Pm10 => "pm10",
            Pollutant::Nh3 => "nh3",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One provider sample (normally hourly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Epoch seconds, UTC.
    pub timestamp: i64,
    pub aqi_category: AqiCategory,
    /// Pollutant name to concentration (μg/m³; CO in the provider's unit).
    pub components: BTreeMap<String, f64>,
}

impl HourlySample {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
    }

    /// Concentration of `pollutant`, or 0.0 when the sample doesn't carry it.
    pub fn component_or_zero(&self, pollutant: Pollutant) -> f64 {
        self.components
            .get(pollutant.key())
            .copied()
            .unwrap_or(0.0)
    }
}

/// Statistical summary of all samples falling on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// English weekday name, e.g. "Monday".
    pub weekday_name: String,
    pub sample_count: usize,
    /// Mean category rounded half-to-even.
    pub mean_aqi_category: u8,
    pub min_aqi_category: u8,
    pub max_aqi_category: u8,
    /// Pollutant key to mean concentration, rounded to 2 decimals.
    pub mean_components: BTreeMap<String, f64>,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}
