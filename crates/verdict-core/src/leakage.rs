//! Prior-intrusion detection for narration text.
//!
//! The narration stage explains a decision from structural data alone.
//! When its output reveals reliance on forbidden concept labels, or on
//! generic experiential reasoning, the explanation has leaked knowledge
//! the observation layer was designed to keep out. Detection is a pure,
//! order-sensitive text classifier: first matching rule wins.

use serde::{Deserialize, Serialize};

/// Sentinel a narration backend emits to self-report reliance on
/// background knowledge.
pub const LEAKAGE_SENTINEL: &str = "PRIOR_INTRUSION";

/// Concept labels the observation layer keeps out of records.
const DEFAULT_CONCEPTS: &[&str] = &["hand", "finger", "thumb", "palm", "digit"];

/// Hedges that signal reliance on background knowledge rather than the
/// supplied data.
const DEFAULT_PHRASES: &[&str] = &[
    "common sense",
    "in my experience",
    "typically",
    "usually",
    "generally speaking",
    "most likely",
    "background knowledge",
];

/// Leakage verdict attached to a narration.
///
/// `reason` is present iff `leaked` is true; construct through
/// [`LeakageVerdict::clean`] and [`LeakageVerdict::flagged`] to keep the
/// two fields in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakageVerdict {
    pub leaked: bool,
    pub reason: Option<String>,
}

impl LeakageVerdict {
    /// No leakage detected.
    pub fn clean() -> Self {
        Self {
            leaked: false,
            reason: None,
        }
    }

    /// Leakage detected for the given reason.
    pub fn flagged(reason: impl Into<String>) -> Self {
        Self {
            leaked: true,
            reason: Some(reason.into()),
        }
    }
}

/// Order-sensitive leakage classifier over raw narration text.
///
/// Rules, in priority order (first match wins):
/// 1. Explicit self-report via [`LEAKAGE_SENTINEL`]
/// 2. Forbidden concept vocabulary
/// 3. Experiential hedge phrases
///
/// All scans are case-insensitive substring matches over the full text.
#[derive(Debug, Clone)]
pub struct LeakageDetector {
    concepts: Vec<String>,
    phrases: Vec<String>,
}

impl LeakageDetector {
    /// Build a detector with an explicit vocabulary. Terms are matched
    /// case-insensitively.
    pub fn new<I, J>(concepts: I, phrases: J) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        J: IntoIterator,
        J::Item: Into<String>,
    {
        Self {
            concepts: concepts
                .into_iter()
                .map(|c| c.into().to_lowercase())
                .collect(),
            phrases: phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Classify a raw narration response.
    pub fn detect(&self, response: &str) -> LeakageVerdict {
        if response.to_uppercase().contains(LEAKAGE_SENTINEL) {
            return LeakageVerdict::flagged("explicit acknowledgment");
        }

        let lower = response.to_lowercase();

        let concepts: Vec<&str> = self
            .concepts
            .iter()
            .filter(|c| lower.contains(c.as_str()))
            .map(String::as_str)
            .collect();
        if !concepts.is_empty() {
            return LeakageVerdict::flagged(format!("Concept labels: {}", concepts.join(", ")));
        }

        let phrases: Vec<&str> = self
            .phrases
            .iter()
            .filter(|p| lower.contains(p.as_str()))
            .map(String::as_str)
            .collect();
        if !phrases.is_empty() {
            return LeakageVerdict::flagged(format!(
                "Experiential qualifiers: {}",
                phrases.join(", ")
            ));
        }

        LeakageVerdict::clean()
    }
}

impl Default for LeakageDetector {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONCEPTS.iter().copied(),
            DEFAULT_PHRASES.iter().copied(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_detector() -> LeakageDetector {
        LeakageDetector::new(["alpha", "beta"], ["common sense"])
    }

    #[test]
    fn test_concept_match_case_insensitive() {
        let verdict = fixed_detector().detect("Alpha likes it");
        assert!(verdict.leaked);
        assert!(verdict.reason.unwrap().contains("alpha"));
    }

    #[test]
    fn test_clean_text() {
        let verdict = fixed_detector().detect("The value follows from the defect count.");
        assert!(!verdict.leaked);
        assert!(verdict.reason.is_none());
    }

    #[test]
    fn test_sentinel_wins_over_concepts() {
        let verdict = fixed_detector().detect("PRIOR_INTRUSION: alpha and beta were assumed");
        assert!(verdict.leaked);
        assert_eq!(verdict.reason.as_deref(), Some("explicit acknowledgment"));
    }

    #[test]
    fn test_sentinel_case_insensitive() {
        let verdict = fixed_detector().detect("prior_intrusion happened here");
        assert!(verdict.leaked);
        assert_eq!(verdict.reason.as_deref(), Some("explicit acknowledgment"));
    }

    #[test]
    fn test_multiple_concepts_listed() {
        let verdict = fixed_detector().detect("both alpha and BETA appear");
        let reason = verdict.reason.unwrap();
        assert!(reason.contains("alpha"));
        assert!(reason.contains("beta"));
    }

    #[test]
    fn test_phrase_scan_after_concepts() {
        let verdict = fixed_detector().detect("By common sense, the count is six.");
        assert!(verdict.leaked);
        assert!(verdict.reason.unwrap().contains("common sense"));
    }

    #[test]
    fn test_default_vocabulary_flags_concept() {
        let verdict = LeakageDetector::default()
            .detect("The shape resembles a hand with spread fingers.");
        assert!(verdict.leaked);
        let reason = verdict.reason.unwrap();
        assert!(reason.contains("hand"));
        assert!(reason.contains("finger"));
    }

    #[test]
    fn test_verdict_fields_move_together() {
        let clean = LeakageVerdict::clean();
        assert_eq!(clean.leaked, clean.reason.is_some());

        let flagged = LeakageVerdict::flagged("x");
        assert_eq!(flagged.leaked, flagged.reason.is_some());
    }
}
