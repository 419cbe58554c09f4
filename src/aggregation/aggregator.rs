//! Reduces provider samples into one [`DailyAggregate`] per UTC calendar day.

use crate::types::pollution::{DailyAggregate, HourlySample, Pollutant};
use chrono::NaiveDate;
use log::warn;
use std::collections::BTreeMap;

/// Rounds half-to-even ("banker's rounding"): 2.5 → 2, 3.5 → 4.
///
/// This is the rounding applied to daily mean AQI categories and, via
/// [`round_to`], to pollutant means.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::round_half_even;
///
/// assert_eq!(round_half_even(2.5), 2.0);
/// assert_eq!(round_half_even(3.5), 4.0);
/// assert_eq!(round_half_even(2.6), 3.0);
/// ```
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}

/// Rounds to `decimals` places, half-to-even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_even(value * factor) / factor
}

/// Groups samples by UTC date and summarizes each day.
///
/// * Samples are bucketed by the UTC calendar date of their epoch timestamp.
/// * `mean_aqi_category` is the arithmetic mean rounded half-to-even.
/// * Every pollutant in [`Pollutant::ALL`] is averaged over *all* of the day's
///   samples; a sample without that pollutant contributes 0.0.
/// * Results are ordered by date ascending; days without samples are never emitted.
///
/// Samples with timestamps outside chrono's representable range are skipped
/// with a warning.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::{aggregate, AqiCategory, HourlySample};
/// use std::collections::BTreeMap;
///
/// let samples: Vec<HourlySample> = (0..24)
///     .map(|hour| HourlySample {
///         timestamp: 1_700_006_400 + hour * 3600, // 2023-11-15T00:00:00Z onward
///         aqi_category: AqiCategory::Fair,
///         components: BTreeMap::new(),
///     })
///     .collect();
///
/// let daily = aggregate(&samples);
/// assert_eq!(daily.len(), 1);
/// assert_eq!(daily[0].sample_count, 24);
/// assert_eq!(daily[0].mean_aqi_category, 2);
/// ```
pub fn aggregate(samples: &[HourlySample]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&HourlySample>> = BTreeMap::new();
    for sample in samples {
        let Some(datetime) = sample.datetime() else {
            warn!("Skipping sample with out-of-range timestamp {}", sample.timestamp);
            continue;
        };
        by_date
            .entry(datetime.date_naive())
            .or_default()
            .push(sample);
    }

    // BTreeMap iteration is chronological, which matches ISO date string order.
    by_date
        .into_iter()
        .filter_map(|(date, day)| summarize_day(date, &day))
        .collect()
}

fn summarize_day(date: NaiveDate, day: &[&HourlySample]) -> Option<DailyAggregate> {
    if day.is_empty() {
        return None;
    }
    let count = day.len() as f64;

    let categories: Vec<u8> = day.iter().map(|s| s.aqi_category.value()).collect();
    let category_sum: f64 = categories.iter().map(|&c| f64::from(c)).sum();
    let mean_aqi_category = round_half_even(category_sum / count) as u8;
    let min_aqi_category = categories.iter().copied().min()?;
    let max_aqi_category = categories.iter().copied().max()?;

    let mean_components = Pollutant::ALL
        .iter()
        .map(|&pollutant| {
            let total: f64 = day.iter().map(|s| s.component_or_zero(pollutant)).sum();
            (pollutant.key().to_string(), round_to(total / count, 2))
        })
        .collect();

    let first_timestamp = day.iter().map(|s| s.timestamp).min()?;
    let last_timestamp = day.iter().map(|s| s.timestamp).max()?;

    Some(DailyAggregate {
        date,
        weekday_name: date.format("%A").to_string(),
        sample_count: day.len(),
        mean_aqi_category,
        min_aqi_category,
        max_aqi_category,
        mean_components,
        first_timestamp,
        last_timestamp,
    })
}
