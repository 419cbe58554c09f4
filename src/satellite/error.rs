use crate::types::gas::GasType;
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SatelliteError {
    #[error("No grid point passed the quality filter (flag 0, relaxed flag <= 1)")]
    NoQualifyingPoints,

    #[error("No valid measurement remained after removing NaN, fill and zero values")]
    NoValidMeasurements,

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("No {gas} granules found in the {days} days up to {end_date}")]
    NoGranules {
        gas: GasType,
        end_date: NaiveDate,
        days: u32,
    },

    #[error("Granule '{0}' has no downloadable data link")]
    MissingDownloadLink(String),

    #[error("Failed to write granule file '{0}'")]
    GranuleWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode granule '{path}': {message}")]
    GranuleDecode { path: PathBuf, message: String },
}
