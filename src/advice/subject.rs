use serde::Serialize;
use std::fmt;

/// Population group that advice is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCategory {
    General,
    Elderly,
    Children,
    Respiratory,
    Cardiovascular,
    PregnantWomen,
    OutdoorWorkers,
}

impl SubjectCategory {
    pub const RISK_GROUPS: [SubjectCategory; 6] = [
        SubjectCategory::Elderly,
        SubjectCategory::Children,
        SubjectCategory::Respiratory,
        SubjectCategory::Cardiovascular,
        SubjectCategory::PregnantWomen,
        SubjectCategory::OutdoorWorkers,
    ];

    /// Matches a free-form group label by keyword, case-insensitively.
    /// Labels that match no risk group are [`SubjectCategory::General`].
    ///
    /// # Examples
    ///
    /// ```
    /// use air_quality_monitor::advice::subject::SubjectCategory;
    ///
    /// assert_eq!(SubjectCategory::from_label("Elderly (65+)"), SubjectCategory::Elderly);
    /// assert_eq!(SubjectCategory::from_label("people with ASTHMA"), SubjectCategory::Respiratory);
    /// assert_eq!(SubjectCategory::from_label("cyclists"), SubjectCategory::General);
    /// ```
    pub fn from_label(label: &str) -> SubjectCategory {
        let label = label.to_lowercase();
        let has = |keywords: &[&str]| keywords.iter().any(|k| label.contains(k));

        if has(&["elder", "65+", "senior", "older adult"]) {
            SubjectCategory::Elderly
        } else if has(&["child", "kid", "infant"]) {
            SubjectCategory::Children
        } else if has(&["respirat", "asthma", "copd", "lung"]) {
            SubjectCategory::Respiratory
        } else if has(&["cardio", "heart"]) {
            SubjectCategory::Cardiovascular
        } else if has(&["pregnan"]) {
            SubjectCategory::PregnantWomen
        } else if has(&["outdoor", "worker"]) {
            SubjectCategory::OutdoorWorkers
        } else {
            SubjectCategory::General
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubjectCategory::General => "General Population",
            SubjectCategory::Elderly => "Elderly (65+)",
            SubjectCategory::Children => "Children",
            SubjectCategory::Respiratory => "People with Respiratory Conditions",
            SubjectCategory::Cardiovascular => "People with Cardiovascular Conditions",
            SubjectCategory::PregnantWomen => "Pregnant Women",
            SubjectCategory::OutdoorWorkers => "Outdoor Workers",
        }
    }
}

impl fmt::Display for SubjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
