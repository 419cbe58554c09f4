//! Parser for single-pixel climate exports: a block of `key: value` metadata
//! lines, one comma-separated header line whose names embed units
//! (`tmax (deg c)`), and comma-separated data rows.

use crate::aggregation::aggregator::round_to;
use crate::climate::error::ClimateError;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Below this many lines there is no room for metadata, header and a data row.
///
/// Lines are counted with [`str::lines`]: a trailing newline ends the last
/// line rather than starting an empty one.
pub const MIN_LINES: usize = 8;

/// Columns summarized in [`ClimateDataset::summary`] when present.
pub const SUMMARY_COLUMNS: [&str; 7] = ["dayl", "prcp", "srad", "swe", "tmax", "tmin", "vp"];

/// Key under which metadata lines without a `key:` prefix are collected.
pub const NOTES_KEY: &str = "notes";

/// One data cell after the numeric sniff.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Coerces `raw` to a number only if, with `.`, `-` and `+` removed, it is
    /// made of ASCII digits alone. Anything else, scientific notation
    /// included, stays text.
    ///
    /// # Examples
    ///
    /// ```
    /// use air_quality_monitor::climate::parser::CellValue;
    ///
    /// assert_eq!(CellValue::sniff("12.5"), CellValue::Number(12.5));
    /// assert_eq!(CellValue::sniff("1.2e3"), CellValue::Text("1.2e3".into()));
    /// ```
    pub fn sniff(raw: &str) -> CellValue {
        let trimmed = raw.trim();
        let stripped: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | '+'))
            .collect();
        if !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(number) = trimmed.parse::<f64>() {
                return CellValue::Number(number);
            }
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

/// The time unit a row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPeriod {
    Date(NaiveDate),
    Year(i32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateRecord {
    /// Derived from the `year` and `yday` columns, when they are numeric.
    pub period: Option<RecordPeriod>,
    /// Canonical column name to cell.
    pub values: BTreeMap<String, CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Rounded to 2 decimals.
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateDataset {
    pub metadata: BTreeMap<String, String>,
    /// Canonical column name to the unit text from the header, e.g. `deg c`.
    pub units: BTreeMap<String, String>,
    pub rows: Vec<ClimateRecord>,
    pub summary: BTreeMap<String, ColumnSummary>,
}

/// `"tmax (deg c)"` → `"tmax"`.
pub fn canonical_column_name(header: &str) -> String {
    let header = header.trim();
    let name = header.split_once(" (").map_or(header, |(name, _)| name);
    name.trim().to_lowercase()
}

fn column_unit(header: &str) -> Option<String> {
    let (_, rest) = header.trim().split_once(" (")?;
    Some(rest.trim_end_matches(')').trim().to_string())
}

/// Parses a climate export. Returns every row; truncation is up to the caller.
///
/// # Errors
///
/// [`ClimateError::MalformedInput`] below [`MIN_LINES`] lines,
/// [`ClimateError::MissingHeader`] when no header line can be identified and
/// [`ClimateError::Table`] when the body is not a consistent CSV table.
pub fn parse(raw: &str) -> Result<ClimateDataset, ClimateError> {
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < MIN_LINES {
        return Err(ClimateError::MalformedInput {
            found: lines.len(),
            required: MIN_LINES,
        });
    }

    let header_index = lines
        .iter()
        .position(|line| is_header_line(line))
        .ok_or(ClimateError::MissingHeader)?;

    let metadata = parse_metadata(&lines[..header_index]);
    let body = lines[header_index..].join("\n");
    let frame = read_body(body)?;

    let mut units = BTreeMap::new();
    let mut columns: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(frame.width());
    for column in frame.get_columns() {
        let header = column.name().as_str();
        let name = canonical_column_name(header);
        if let Some(unit) = column_unit(header) {
            units.insert(name.clone(), unit);
        }
        let cells = column
            .str()
            .map_err(ClimateError::Table)?
            .into_iter()
            .map(|cell| CellValue::sniff(cell.unwrap_or_default()))
            .collect();
        columns.push((name, cells));
    }

    let rows = (0..frame.height())
        .map(|i| {
            let values: BTreeMap<String, CellValue> = columns
                .iter()
                .map(|(name, cells)| (name.clone(), cells[i].clone()))
                .collect();
            ClimateRecord {
                period: record_period(&values),
                values,
            }
        })
        .collect();

    let summary = summarize(&columns);

    Ok(ClimateDataset {
        metadata,
        units,
        rows,
        summary,
    })
}

fn is_header_line(line: &str) -> bool {
    let line = line.trim();
    match line.split_once(',') {
        Some((first, _)) => !first.contains(':'),
        None => false,
    }
}

fn parse_metadata(lines: &[&str]) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let mut notes: Vec<&str> = Vec::new();
    for line in lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        match line.split_once(':') {
            Some((key, value)) => {
                metadata.insert(key.trim().to_string(), value.trim().to_string());
            }
            None => notes.push(line),
        }
    }
    if !notes.is_empty() {
        metadata.insert(NOTES_KEY.to_string(), notes.join("\n"));
    }
    metadata
}

fn read_body(body: String) -> Result<DataFrame, ClimateError> {
    // Schema inference is off so every column arrives as text and the sniff
    // decides what is numeric.
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()
        .map_err(ClimateError::Table)
}

fn record_period(values: &BTreeMap<String, CellValue>) -> Option<RecordPeriod> {
    let year = values.get("year").and_then(CellValue::as_f64)?;
    let year = year as i32;
    match values.get("yday").and_then(CellValue::as_f64) {
        Some(yday) => NaiveDate::from_yo_opt(year, yday as u32).map(RecordPeriod::Date),
        None => Some(RecordPeriod::Year(year)),
    }
}

fn summarize(columns: &[(String, Vec<CellValue>)]) -> BTreeMap<String, ColumnSummary> {
    let mut summary = BTreeMap::new();
    for (name, cells) in columns {
        if !SUMMARY_COLUMNS.contains(&name.as_str()) {
            continue;
        }
        let numeric: Vec<f64> = cells.iter().filter_map(CellValue::as_f64).collect();
        let count = numeric.len();
        let series = Float64Chunked::from_vec(name.as_str().into(), numeric);
        let (Some(mean), Some(min), Some(max)) = (series.mean(), series.min(), series.max())
        else {
            continue;
        };
        summary.insert(
            name.clone(),
            ColumnSummary {
                mean: round_to(mean, 2),
                min,
                max,
                count,
            },
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Latitude: 35.9621  Longitude: -84.2916
X & Y on Lambert Conformal Conic: 1158797.58 -426188.11
Tile: 11207
Elevation: 263 meters
All years; all variables; Daymet Software Version 4.0; Daymet Data Version 4.0.
How to cite: Thornton, P.E., et al. Daymet: Daily Surface Weather Data on a 1-km Grid.

year,yday,dayl (s),prcp (mm/day),srad (W/m^2),swe (kg/m^2),tmax (deg c),tmin (deg c),vp (Pa)
2020,1,34571.11,0.00,230.40,0.00,12.5,-1.50,548.26
2020,2,34606.19,3.20,118.11,0.00,9.0,2.00,705.61
2020,3,34644.13,12.08,1.2e3,0.00,15.5,n/a,1060.00
";

    #[test]
    fn test_parses_metadata_rows_and_units() {
        let dataset = parse(SAMPLE).unwrap();
        assert_eq!(dataset.metadata["Tile"], "11207");
        assert_eq!(dataset.metadata["Elevation"], "263 meters");
        assert_eq!(dataset.metadata["Latitude"], "35.9621  Longitude: -84.2916");
        assert!(dataset.metadata[NOTES_KEY].starts_with("All years"));
        assert_eq!(dataset.units["tmax"], "deg c");
        assert_eq!(dataset.rows.len(), 3);

        let first = &dataset.rows[0];
        assert_eq!(
            first.period,
            Some(RecordPeriod::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()))
        );
        assert_eq!(first.values["tmax"], CellValue::Number(12.5));
        assert_eq!(first.values["tmin"], CellValue::Number(-1.5));
    }

    #[test]
    fn test_scientific_notation_is_not_numeric() {
        let dataset = parse(SAMPLE).unwrap();
        assert_eq!(dataset.rows[2].values["srad"], CellValue::Text("1.2e3".into()));
        assert_eq!(dataset.rows[2].values["tmin"], CellValue::Text("n/a".into()));
        // Only the two numeric srad cells are summarized.
        assert_eq!(dataset.summary["srad"].count, 2);
        assert_eq!(dataset.summary["tmin"].count, 2);
    }

    #[test]
    fn test_summary_statistics() {
        let dataset = parse(SAMPLE).unwrap();
        let tmax = &dataset.summary["tmax"];
        assert_eq!(tmax.count, 3);
        assert_eq!(tmax.mean, 12.33);
        assert_eq!(tmax.min, 9.0);
        assert_eq!(tmax.max, 15.5);
        // Only the fixed column set is summarized.
        assert!(!dataset.summary.contains_key("year"));
        assert!(!dataset.summary.contains_key("yday"));
    }

    #[test]
    fn test_missing_columns_are_absent_from_summary() {
        let raw = "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\n\nyear,yday,tmax (deg c)\n2021,10,4.0\n";
        let dataset = parse(raw).unwrap();
        assert_eq!(dataset.summary.len(), 1);
        assert!(dataset.summary.contains_key("tmax"));
    }

    #[test]
    fn test_year_only_rows() {
        let raw = "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\nf: 6\nyear,prcp (mm)\n1999,800.5\n";
        let dataset = parse(raw).unwrap();
        assert_eq!(dataset.rows[0].period, Some(RecordPeriod::Year(1999)));
    }

    #[test]
    fn test_too_few_lines() {
        let raw = "a: 1\nyear,tmax (deg c)\n2020,1.0\n";
        assert!(matches!(
            parse(raw),
            Err(ClimateError::MalformedInput {
                found: 3,
                required: 8
            })
        ));
    }

    #[test]
    fn test_trailing_newline_is_not_a_line() {
        let seven = "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\nyear,tmax (deg c)\n2020,1.0\n";
        assert!(matches!(
            parse(seven),
            Err(ClimateError::MalformedInput { found: 7, .. })
        ));

        let eight = "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\nyear,tmax (deg c)\n2020,1.0\n2020,2.0";
        assert_eq!(parse(eight).unwrap().rows.len(), 2);
    }

    #[test]
    fn test_no_header() {
        let raw = "a: 1\nb: 2\nc: 3\nd: 4\ne: 5\nf: 6\ng: 7\nh: 8\n";
        assert!(matches!(parse(raw), Err(ClimateError::MissingHeader)));
    }

    #[test]
    fn test_sniff() {
        assert_eq!(CellValue::sniff(" -3 "), CellValue::Number(-3.0));
        assert_eq!(CellValue::sniff("+0.25"), CellValue::Number(0.25));
        assert_eq!(CellValue::sniff(""), CellValue::Text(String::new()));
        assert_eq!(CellValue::sniff("1.2.3"), CellValue::Text("1.2.3".into()));
        assert_eq!(canonical_column_name("Tmax (deg c)"), "tmax");
        assert_eq!(canonical_column_name("year"), "year");
    }
}
