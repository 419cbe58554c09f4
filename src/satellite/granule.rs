use crate::satellite::error::SatelliteError;
use crate::satellite::grid::SatelliteGrid;
use crate::types::gas::GasType;
use crate::types::location::LatLon;
use chrono::NaiveDate;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reads a downloaded level-3 granule into a [`SatelliteGrid`].
///
/// Implementations read the tropospheric column variable, its `_FillValue`
/// and `units` attributes, the main data quality flag and the latitude and
/// longitude axes. Decoding runs on a blocking thread, so implementations may
/// do synchronous file I/O.
pub trait GranuleDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<SatelliteGrid, SatelliteError>;
}

impl fmt::Debug for dyn GranuleDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GranuleDecoder")
    }
}

/// Where a granule downloaded for one request is stored.
///
/// The file name carries gas, date and the rounded request coordinates in
/// addition to the granule's own name, so requests for different points
/// never share a file.
pub fn granule_path(
    data_dir: &Path,
    gas: GasType,
    date: NaiveDate,
    target: LatLon,
    granule_name: &str,
) -> PathBuf {
    let file_name = format!(
        "{}_{}_{:.4}_{:.4}_{}",
        gas.code(),
        date.format("%Y%m%d"),
        target.0,
        target.1,
        sanitize_file_name(granule_name),
    );
    data_dir.join(file_name)
}

fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
