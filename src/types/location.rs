use crate::types::us_states::abbreviation;
use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use air_quality_monitor::LatLon;
///
/// let sao_paulo = LatLon(-23.55, -46.63);
/// assert_eq!(sao_paulo.0, -23.55);
/// assert_eq!(sao_paulo.1, -46.63);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Both components finite and within the usual degree ranges.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

/// Coordinates as they appear in response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl From<LatLon> for Coordinates {
    fn from(value: LatLon) -> Self {
        Coordinates {
            lat: value.0,
            lon: value.1,
        }
    }
}

/// One geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMatch {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub state: Option<String>,
    /// Human-readable "name, state, country" label.
    pub formatted_display_string: String,
}

impl LocationMatch {
    /// Builds a match and its display string `name, state, country`, skipping
    /// absent parts. With a `US` country filter the state is shown by its
    /// postal abbreviation when one is known.
    pub fn new(
        name: String,
        lat: f64,
        lon: f64,
        country: String,
        state: Option<String>,
        country_filter: Option<&str>,
    ) -> Self {
        let us_filter = country_filter.is_some_and(|c| c.trim().eq_ignore_ascii_case("US"));
        let state_label = state.as_deref().map(|s| {
            us_filter
                .then(|| abbreviation(s))
                .flatten()
                .unwrap_or(s)
        });

        let formatted_display_string = [Some(name.as_str()), state_label, Some(country.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name,
            lat,
            lon,
            country,
            state,
            formatted_display_string,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_filter_uses_abbreviation() {
        let hit = LocationMatch::new(
            "Albany".into(),
            42.65,
            -73.75,
            "US".into(),
            Some("New York".into()),
            Some("us"),
        );
        assert_eq!(hit.formatted_display_string, "Albany, NY, US");
        assert_eq!(hit.state.as_deref(), Some("New York"));
    }

    #[test]
    fn test_full_state_without_us_filter() {
        let hit = LocationMatch::new(
            "Albany".into(),
            42.65,
            -73.75,
            "US".into(),
            Some("New York".into()),
            None,
        );
        assert_eq!(hit.formatted_display_string, "Albany, New York, US");
    }

    #[test]
    fn test_unknown_state_and_missing_state() {
        let hit = LocationMatch::new(
            "Toronto".into(),
            43.65,
            -79.38,
            "CA".into(),
            Some("Ontario".into()),
            Some("US"),
        );
        assert_eq!(hit.formatted_display_string, "Toronto, Ontario, CA");

        let hit = LocationMatch::new("Paris".into(), 48.85, 2.35, "FR".into(), None, None);
        assert_eq!(hit.formatted_display_string, "Paris, FR");
    }

    #[test]
    fn test_validity() {
        assert!(LatLon(-23.55, -46.63).is_valid());
        assert!(!LatLon(91.0, 0.0).is_valid());
        assert!(!LatLon(f64::NAN, 0.0).is_valid());
    }
}
