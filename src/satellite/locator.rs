//! Nearest-cell lookup over a satellite grid.
//!
//! "Nearest" is the plain Euclidean distance in (latitude, longitude) degree
//! space, without any correction for longitude compression or earth
//! curvature. Results must stay reproducible against the reference outputs,
//! so the metric is kept as is. The great-circle distance is reported next to
//! it for information only and never influences the selection.

use crate::satellite::error::SatelliteError;
use crate::satellite::grid::GridPoint;
use crate::types::location::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;
use serde::Serialize;

/// Values below this are fill sentinels (the product's fill is about -9.97e36).
pub const FILL_VALUE_THRESHOLD: f64 = -9.0e36;

/// Quality filter tiers, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// Only cells flagged 0 (best quality).
    Strict,
    /// Cells flagged 0 or 1.
    Relaxed,
}

impl QualityTier {
    pub const ORDER: [QualityTier; 2] = [QualityTier::Strict, QualityTier::Relaxed];

    pub fn accepts(self, quality_flag: i32) -> bool {
        match self {
            QualityTier::Strict => quality_flag == 0,
            QualityTier::Relaxed => quality_flag <= 1,
        }
    }
}

/// The grid cell closest to a target point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    pub value: f64,
    /// Euclidean distance in degrees.
    pub distance: f64,
    /// Great-circle distance, informational.
    pub distance_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub unit: String,
    pub quality_tier: QualityTier,
    /// How many cells survived the quality and validity filters.
    pub candidates: usize,
}

/// Whether a measured value is usable: not NaN, not a fill value, not zero.
/// Zero means "no data" in these products.
pub fn is_valid_value(value: f64, declared_fill: Option<f64>) -> bool {
    !value.is_nan()
        && value >= FILL_VALUE_THRESHOLD
        && value != 0.0
        && declared_fill.is_none_or(|fill| value != fill)
}

/// Euclidean distance in degree space.
pub fn degree_distance(target: LatLon, latitude: f64, longitude: f64) -> f64 {
    ((latitude - target.0).powi(2) + (longitude - target.1).powi(2)).sqrt()
}

/// Locates measurements in a flattened grid.
#[derive(Debug, Clone, Default)]
pub struct SatelliteLocator {
    declared_fill: Option<f64>,
    unit: String,
}

impl SatelliteLocator {
    pub fn new(unit: impl Into<String>, declared_fill: Option<f64>) -> Self {
        Self {
            declared_fill,
            unit: unit.into(),
        }
    }

    /// Finds the valid cell nearest to `target`, relaxing the quality filter
    /// from flag 0 to flag <= 1 only when the strict tier leaves nothing usable.
    ///
    /// # Errors
    ///
    /// [`SatelliteError::NoQualifyingPoints`] when no cell passes either
    /// quality tier, [`SatelliteError::NoValidMeasurements`] when cells pass but
    /// all of them are NaN, fill or zero.
    pub fn locate(
        &self,
        target: LatLon,
        points: &[GridPoint],
    ) -> Result<NearestMatch, SatelliteError> {
        let mut any_qualified = false;
        for tier in QualityTier::ORDER {
            match self.locate_with(target, points, tier, |p| tier.accepts(p.quality_flag)) {
                Ok(found) => return Ok(found),
                Err(SatelliteError::NoQualifyingPoints) => {}
                Err(SatelliteError::NoValidMeasurements) => any_qualified = true,
                Err(other) => return Err(other),
            }
        }
        if any_qualified {
            Err(SatelliteError::NoValidMeasurements)
        } else {
            Err(SatelliteError::NoQualifyingPoints)
        }
    }

    /// Single-tier lookup with an arbitrary quality predicate.
    ///
    /// Ties on distance go to the cell that comes first in `points`.
    pub fn locate_with(
        &self,
        target: LatLon,
        points: &[GridPoint],
        tier: QualityTier,
        quality_predicate: impl Fn(&GridPoint) -> bool,
    ) -> Result<NearestMatch, SatelliteError> {
        let qualified: Vec<&GridPoint> = points.iter().filter(|p| quality_predicate(p)).collect();
        if qualified.is_empty() {
            return Err(SatelliteError::NoQualifyingPoints);
        }

        let valid: Vec<&GridPoint> = qualified
            .into_iter()
            .filter(|p| is_valid_value(p.value, self.declared_fill))
            .collect();

        // min_by_key keeps the first of equally distant cells.
        let (nearest, nearest_distance) = valid
            .iter()
            .map(|p| (*p, degree_distance(target, p.latitude, p.longitude)))
            .min_by_key(|(_, d)| OrderedFloat(*d))
            .ok_or(SatelliteError::NoValidMeasurements)?;

        let distance_km = distance(
            HaversineLocation {
                latitude: target.0,
                longitude: target.1,
            },
            HaversineLocation {
                latitude: nearest.latitude,
                longitude: nearest.longitude,
            },
            Units::Kilometers,
        );

        Ok(NearestMatch {
            value: nearest.value,
            distance: nearest_distance,
            distance_km,
            latitude: nearest.latitude,
            longitude: nearest.longitude,
            unit: self.unit.clone(),
            quality_tier: tier,
            candidates: valid.len(),
        })
    }
}
