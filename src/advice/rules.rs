//! Canned advice used when no generative backend is available.

use crate::advice::subject::SubjectCategory;
use crate::types::pollution::AqiCategory;

/// Advice bullets for one AQI category and population group.
///
/// Every risk group has its own entry for every category;
/// [`SubjectCategory::General`] covers everyone else.
pub fn rule_based_advice(aqi: AqiCategory, subject: SubjectCategory) -> &'static [&'static str] {
    use AqiCategory::*;
    use SubjectCategory::*;

    match (aqi, subject) {
        (Good, General) => &[
            "Air quality is good. Enjoy your usual outdoor activities.",
            "A good time to ventilate your home.",
        ],
        (Fair, General) => &[
            "Air quality is acceptable for most people.",
            "Unusually sensitive people should watch for coughing or shortness of breath.",
        ],
        (Moderate, General) => &[
            "Consider reducing prolonged or heavy outdoor exertion.",
            "Take more breaks during outdoor activities.",
        ],
        (Poor, General) => &[
            "Reduce prolonged or heavy outdoor exertion.",
            "Keep windows closed and move activities indoors where possible.",
        ],
        (VeryPoor, General) => &[
            "Avoid all strenuous outdoor activity.",
            "Stay indoors with windows closed and use an air purifier if available.",
        ],

        (Good, Elderly) => &[
            "Air quality is good. Outdoor walks are encouraged.",
            "Keep up regular physical activity.",
        ],
        (Fair, Elderly) => &[
            "Outdoor activity is fine; slow down if you notice breathing discomfort.",
            "Keep your usual medication at hand.",
        ],
        (Moderate, Elderly) => &[
            "Shorten outdoor walks and avoid busy roads.",
            "Rest indoors if you feel tired or short of breath.",
        ],
        (Poor, Elderly) => &[
            "Limit time outdoors, especially during the afternoon.",
            "Contact your doctor if you notice chest pain or unusual fatigue.",
        ],
        (VeryPoor, Elderly) => &[
            "Stay indoors and keep physical effort light.",
            "Seek medical help promptly if symptoms appear.",
        ],

        (Good, Children) => &[
            "Air quality is good. Outdoor play is encouraged.",
            "A great day for sports and school activities outside.",
        ],
        (Fair, Children) => &[
            "Outdoor play is fine for most children.",
            "Children with asthma should keep their inhaler nearby.",
        ],
        (Moderate, Children) => &[
            "Prefer shorter, less intense outdoor play.",
            "Keep children away from heavy traffic areas.",
        ],
        (Poor, Children) => &[
            "Move sports and recess indoors.",
            "Watch for coughing, wheezing or complaints of chest tightness.",
        ],
        (VeryPoor, Children) => &[
            "Keep children indoors.",
            "Postpone outdoor school activities and sports events.",
        ],

        (Good, Respiratory) => &[
            "Air quality is good. Normal activities are fine.",
            "Keep following your usual treatment plan.",
        ],
        (Fair, Respiratory) => &[
            "Most activities are fine; carry your rescue inhaler.",
            "Stop and rest if symptoms start.",
        ],
        (Moderate, Respiratory) => &[
            "Reduce prolonged outdoor exertion.",
            "Keep quick-relief medication with you at all times.",
        ],
        (Poor, Respiratory) => &[
            "Avoid outdoor exertion and stay indoors when possible.",
            "Follow your action plan and contact your doctor if symptoms worsen.",
        ],
        (VeryPoor, Respiratory) => &[
            "Remain indoors with windows closed.",
            "Seek urgent care if breathing becomes difficult.",
        ],

        (Good, Cardiovascular) => &[
            "Air quality is good. Moderate exercise outdoors is fine.",
            "Keep up your usual routine.",
        ],
        (Fair, Cardiovascular) => &[
            "Outdoor activity is fine; avoid sudden heavy effort.",
            "Pay attention to palpitations or unusual fatigue.",
        ],
        (Moderate, Cardiovascular) => &[
            "Reduce heavy outdoor exertion.",
            "Avoid exercising near busy roads.",
        ],
        (Poor, Cardiovascular) => &[
            "Avoid strenuous activity outdoors.",
            "Contact your doctor if you feel chest pain or shortness of breath.",
        ],
        (VeryPoor, Cardiovascular) => &[
            "Stay indoors and keep activity light.",
            "Seek emergency care for chest pain or irregular heartbeat.",
        ],

        (Good, PregnantWomen) => &[
            "Air quality is good. Outdoor activity is safe.",
            "Enjoy light exercise such as walking.",
        ],
        (Fair, PregnantWomen) => &[
            "Outdoor activity is fine; stay well hydrated.",
            "Avoid lingering near heavy traffic.",
        ],
        (Moderate, PregnantWomen) => &[
            "Limit prolonged time outdoors.",
            "Choose parks and green areas over busy streets.",
        ],
        (Poor, PregnantWomen) => &[
            "Stay indoors as much as possible.",
            "Keep indoor air clean and avoid smoke of any kind.",
        ],
        (VeryPoor, PregnantWomen) => &[
            "Remain indoors and avoid physical strain.",
            "Talk to your doctor if you feel unwell.",
        ],

        (Good, OutdoorWorkers) => &[
            "Air quality is good. Work normally.",
            "Stay hydrated during the shift.",
        ],
        (Fair, OutdoorWorkers) => &[
            "Normal work is fine; take regular breaks.",
            "Report any breathing discomfort to your supervisor.",
        ],
        (Moderate, OutdoorWorkers) => &[
            "Schedule heavy tasks for early morning.",
            "Take more frequent breaks in clean-air areas.",
        ],
        (Poor, OutdoorWorkers) => &[
            "Reduce heavy physical work outdoors.",
            "Wear a well-fitted N95 or FFP2 mask.",
        ],
        (VeryPoor, OutdoorWorkers) => &[
            "Postpone non-essential outdoor work.",
            "If work must continue, wear an N95 or FFP2 mask and rotate tasks indoors.",
        ],
    }
}

/// Rule-based advice as normalized text, one bullet per line.
pub fn rule_based_text(aqi: AqiCategory, subject: SubjectCategory) -> String {
    rule_based_advice(aqi, subject)
        .iter()
        .map(|line| format!("{} {line}", crate::advice::normalizer::BULLET))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::normalizer::normalize;

    const CATEGORIES: [AqiCategory; 5] = [
        AqiCategory::Good,
        AqiCategory::Fair,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
    ];

    #[test]
    fn test_every_cell_has_advice() {
        let subjects = SubjectCategory::RISK_GROUPS
            .into_iter()
            .chain([SubjectCategory::General]);
        for subject in subjects {
            for aqi in CATEGORIES {
                assert!(!rule_based_advice(aqi, subject).is_empty(), "{aqi} / {subject}");
            }
        }
    }

    #[test]
    fn test_unknown_label_uses_general_entry() {
        let subject = SubjectCategory::from_label("Weekend hikers");
        assert_eq!(
            rule_based_advice(AqiCategory::Poor, subject),
            rule_based_advice(AqiCategory::Poor, SubjectCategory::General)
        );
    }

    #[test]
    fn test_rule_text_is_already_normalized() {
        for aqi in CATEGORIES {
            let text = rule_based_text(aqi, SubjectCategory::Children);
            assert_eq!(normalize(&text, SubjectCategory::Children.label()), text);
        }
    }
}
