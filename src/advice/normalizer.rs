//! Cleans generated advice text into a uniform bullet list.
//!
//! The normalizer knows nothing about the backend that wrote the text. It is
//! idempotent: feeding its output back in returns the same text.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::sync::LazyLock;

/// The one bullet symbol used in normalized text.
pub const BULLET: char = '•';

#[allow(clippy::expect_used)] // Static pattern
static BULLET_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])(?:\s+|$)").expect("valid bullet pattern"));

#[allow(clippy::expect_used)] // Static pattern
static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:as an ai(?: language model)?,|i apologize,|here (?:are|is) (?:some|the)\b|based on (?:the|this) (?:information|data),|remember:|please note:|note:)\s*",
    )
    .expect("valid lead-in pattern")
});

#[allow(clippy::expect_used)] // Static pattern
static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace pattern"));

const QUOTE_PAIRS: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

/// Normalizes raw advice for `subject_label`.
///
/// Per line: spaces are collapsed and the line trimmed, generic lead-in
/// phrases are removed, `-`, `*` and `N.` markers become [`BULLET`], and on
/// bullet lines a leading `<subject_label>:` / `<subject_label> -` and
/// wrapping quotes are stripped. Lines left empty by the stripping are
/// dropped, as are repeated bullets. Runs of blank lines collapse to one
/// blank line and the text never starts or ends with one.
///
/// # Examples
///
/// ```
/// use air_quality_monitor::advice::normalizer::normalize;
///
/// let raw = "Here are some tips:\n\n\n1. Children: \"Stay indoors\"\n*  Keep   windows closed";
/// let clean = normalize(raw, "Children");
/// assert_eq!(clean, "tips:\n\n• Stay indoors\n• Keep windows closed");
/// assert_eq!(normalize(&clean, "Children"), clean);
/// ```
pub fn normalize(raw: &str, subject_label: &str) -> String {
    let label_prefix = label_prefix_pattern(subject_label);
    let mut seen_bullets: HashSet<String> = HashSet::new();
    let mut lines: Vec<String> = Vec::new();

    for raw_line in raw.lines() {
        let line = SPACE_RUN.replace_all(raw_line.trim(), " ");
        if line.is_empty() {
            push_blank(&mut lines);
            continue;
        }

        let Some(cleaned) = clean_line(&line, label_prefix.as_ref()) else {
            continue;
        };
        if let Some(content) = cleaned.strip_prefix(BULLET) {
            if !seen_bullets.insert(content.trim().to_lowercase()) {
                continue;
            }
        }
        lines.push(cleaned);
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.join("\n")
}

/// The bullet contents of normalized text, without the bullet symbol.
pub fn bullets(normalized: &str) -> Vec<String> {
    normalized
        .lines()
        .filter_map(|line| line.strip_prefix(BULLET))
        .map(|content| content.trim().to_string())
        .collect()
}

fn push_blank(lines: &mut Vec<String>) {
    if lines.last().is_some_and(|last| !last.is_empty()) {
        lines.push(String::new());
    }
}

fn label_prefix_pattern(subject_label: &str) -> Option<Regex> {
    let label = subject_label.trim();
    if label.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"^{}\s*[:\-–]\s*", regex::escape(label)))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Strips one line down to its content. `None` when nothing is left.
fn clean_line(line: &str, label_prefix: Option<&Regex>) -> Option<String> {
    let mut content = line.trim().to_string();
    let mut is_bullet = false;

    // Strippers can expose one another ("Note: - Children: ..."), so repeat
    // until nothing changes.
    loop {
        let before = content.clone();

        content = LEAD_IN.replace(&content, "").trim().to_string();
        if let Some(found) = BULLET_MARKER.find(&content) {
            is_bullet = true;
            content = content[found.end()..].trim().to_string();
        }
        if is_bullet {
            if let Some(prefix) = label_prefix {
                content = prefix.replace(&content, "").trim().to_string();
            }
            content = strip_wrapping_quotes(&content).trim().to_string();
        }

        if content == before {
            break;
        }
    }

    if content.is_empty() {
        return None;
    }
    Some(if is_bullet {
        format!("{BULLET} {content}")
    } else {
        content
    })
}

fn strip_wrapping_quotes(text: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_become_canonical_bullets() {
        let raw = "- Wear a mask\n* Avoid traffic\n3. Use an air purifier\n• Drink water";
        assert_eq!(
            normalize(raw, ""),
            "• Wear a mask\n• Avoid traffic\n• Use an air purifier\n• Drink water"
        );
    }

    #[test]
    fn test_label_prefix_and_quotes_stripped() {
        let raw = "- Elderly (65+): \"Limit outdoor walks\"\n- ELDERLY (65+) - Keep medication nearby";
        assert_eq!(
            normalize(raw, "Elderly (65+)"),
            "• Limit outdoor walks\n• Keep medication nearby"
        );
    }

    #[test]
    fn test_lead_ins_removed() {
        let raw = "As an AI, I cannot see you.\nPlease note: ozone peaks in the afternoon.\n- Note: close windows\nBased on this data, stay inside.\nI apologize, here is more.";
        assert_eq!(
            normalize(raw, "Children"),
            "I cannot see you.\nozone peaks in the afternoon.\n• close windows\nstay inside.\nhere is more."
        );
    }

    #[test]
    fn test_lines_emptied_by_stripping_are_dropped() {
        let raw = "Remember:\n- \"\"\n- Children:\n- Stay hydrated";
        assert_eq!(normalize(raw, "Children"), "• Stay hydrated");

        let raw = "- Stay inside\n-\n*\n3.\n•\n- Close windows";
        assert_eq!(normalize(raw, ""), "• Stay inside\n• Close windows");
    }

    #[test]
    fn test_blank_runs_collapse() {
        let raw = "\n\nFirst\n\n\n\n\nSecond\n\n\n";
        assert_eq!(normalize(raw, ""), "First\n\nSecond");
    }

    #[test]
    fn test_duplicate_bullets_removed() {
        let raw = "- Stay indoors\n- stay  indoors\n- Close windows";
        assert_eq!(normalize(raw, ""), "• Stay indoors\n• Close windows");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Here are the recommendations:\n\n1. Children - 'Avoid parks'\n2. Note: Wear N95 masks\n\n\n- - nested marker",
            "   Remember:   keep   calm   \n*   \"quoted\"   ",
            "Plain paragraph without bullets.",
        ];
        for raw in samples {
            let once = normalize(raw, "Children");
            assert_eq!(normalize(&once, "Children"), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_bullets_extracted() {
        let text = normalize("Intro\n- One\n- Two", "");
        assert_eq!(bullets(&text), ["One", "Two"]);
    }
}
