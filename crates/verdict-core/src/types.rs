//! Result types shared across the pipeline.
//!
//! Stage results are produced once, never mutated, and serialized with
//! stable field names so historical audit logs stay comparable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::leakage::LeakageVerdict;

/// Serialize latencies as fractional seconds under stable names.
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

/// The closed set of judgment outcomes.
///
/// A bounded value carries its integer; the other outcomes never do, so
/// the "value present iff bounded" invariant is enforced by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Judgment {
    BoundedValue { value: u64 },
    Indeterminate,
    Halted,
}

impl Judgment {
    /// The extracted value, present only for bounded outcomes.
    pub fn value(&self) -> Option<u64> {
        match self {
            Judgment::BoundedValue { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self, Judgment::BoundedValue { .. })
    }

    /// Stable outcome label, as written to audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Judgment::BoundedValue { .. } => "BOUNDED_VALUE",
            Judgment::Indeterminate => "INDETERMINATE",
            Judgment::Halted => "HALTED",
        }
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Judgment::BoundedValue { value } => write!(f, "BOUNDED_VALUE({})", value),
            Judgment::Indeterminate => write!(f, "INDETERMINATE"),
            Judgment::Halted => write!(f, "HALTED"),
        }
    }
}

/// Output of the judge stage. Produced once per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Originating record id
    pub record_id: String,

    /// When the judgment was rendered
    pub timestamp: DateTime<Utc>,

    /// The judgment itself (outcome tag plus value when bounded)
    #[serde(flatten)]
    pub judgment: Judgment,

    /// Free-text rationale from the decoding grammar or failure path
    pub rationale: String,

    /// Raw backend response, kept verbatim for audit
    pub raw_response: String,

    /// Model that served the judgment
    pub model: String,

    /// Wall-clock latency of the stage
    #[serde(with = "duration_secs", rename = "latency_s")]
    pub latency: Duration,
}

/// Output of the narration stage. Produced at most once per run, only
/// for bounded decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationResult {
    /// Originating record id
    pub record_id: String,

    /// When the narration was rendered
    pub timestamp: DateTime<Utc>,

    /// Narration text (or the error sentinel on transport failure)
    pub explanation: String,

    /// Leakage verdict over the raw narration
    #[serde(flatten)]
    pub leakage: LeakageVerdict,

    /// Model that served the narration
    pub model: String,

    /// Wall-clock latency of the stage
    #[serde(with = "duration_secs", rename = "latency_s")]
    pub latency: Duration,
}

/// Aggregated pipeline run result.
///
/// # Authority Invariant
/// `final` is a verbatim copy of the decision's judgment, for all runs,
/// unconditionally. Narration content, leakage, and narration failure
/// never influence it. [`PipelineResult::from_stages`] is the only
/// constructor, and it performs the copy itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Originating record id
    pub record_id: String,

    /// Judge stage output
    pub decision: DecisionResult,

    /// Narration stage output; absent on early termination or when the
    /// run terminated before the stage
    pub narration: Option<NarrationResult>,

    /// Final judgment, copied verbatim from `decision`
    #[serde(rename = "final")]
    pub final_judgment: Judgment,

    /// Whether the run skipped narration
    pub stopped_early: bool,
}

impl PipelineResult {
    /// Assemble the run result from stage outputs.
    ///
    /// The final judgment is taken from the decision alone. A narration
    /// for a non-bounded decision is a sequencing defect upstream, so it
    /// is debug-asserted here.
    pub fn from_stages(decision: DecisionResult, narration: Option<NarrationResult>) -> Self {
        debug_assert!(
            narration.is_none() || decision.judgment.is_bounded(),
            "narration present for non-bounded decision"
        );

        let final_judgment = decision.judgment;
        let stopped_early = !final_judgment.is_bounded();

        Self {
            record_id: decision.record_id.clone(),
            decision,
            narration,
            final_judgment,
            stopped_early,
        }
    }

    /// Whether the narration leaked forbidden concepts.
    pub fn leakage_detected(&self) -> bool {
        self.narration
            .as_ref()
            .map(|n| n.leakage.leaked)
            .unwrap_or(false)
    }
}

/// Report from a repeatability check over one record.
///
/// A mismatch is reported, never auto-corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Whether every run produced the identical judgment
    pub consistent: bool,

    /// Observed judgments, in run order
    pub observed: Vec<Judgment>,
}

impl ConsistencyReport {
    /// Compare the observed judgments of repeated runs.
    pub fn from_observations(observed: Vec<Judgment>) -> Self {
        let consistent = observed.windows(2).all(|pair| pair[0] == pair[1]);
        Self {
            consistent,
            observed,
        }
    }

    pub fn runs(&self) -> usize {
        self.observed.len()
    }
}
