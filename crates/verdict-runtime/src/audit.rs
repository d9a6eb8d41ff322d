//! Audit serialization of pipeline results.
//!
//! An audit record is a flat projection of a [`PipelineResult`] with
//! stable field names, so logs written months apart stay comparable.
//! Audit output is for after-the-fact review; correctness never depends
//! on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use verdict_core::PipelineResult;

/// Errors from audit persistence.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flat audit row. Field names are part of the audit contract - rename
/// nothing without migrating historical logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: String,
    pub decided_at: DateTime<Utc>,
    pub outcome: String,
    pub value: Option<u64>,
    pub rationale: String,
    pub explanation: Option<String>,
    pub leaked: bool,
    pub leak_reason: Option<String>,
    pub judge_model: String,
    pub narrator_model: Option<String>,
    pub judge_latency_s: f64,
    pub narration_latency_s: Option<f64>,
    pub stopped_early: bool,
}

impl From<&PipelineResult> for AuditRecord {
    fn from(result: &PipelineResult) -> Self {
        let narration = result.narration.as_ref();
        Self {
            record_id: result.record_id.clone(),
            decided_at: result.decision.timestamp,
            outcome: result.final_judgment.label().to_string(),
            value: result.final_judgment.value(),
            rationale: result.decision.rationale.clone(),
            explanation: narration.map(|n| n.explanation.clone()),
            leaked: result.leakage_detected(),
            leak_reason: narration.and_then(|n| n.leakage.reason.clone()),
            judge_model: result.decision.model.clone(),
            narrator_model: narration.map(|n| n.model.clone()),
            judge_latency_s: result.decision.latency.as_secs_f64(),
            narration_latency_s: narration.map(|n| n.latency.as_secs_f64()),
            stopped_early: result.stopped_early,
        }
    }
}

/// Write a pipeline result as a pretty-printed audit record.
pub fn write_audit<W: Write>(result: &PipelineResult, writer: W) -> Result<(), AuditError> {
    let record = AuditRecord::from(result);
    serde_json::to_writer_pretty(writer, &record)?;
    Ok(())
}

/// Write an audit record to a file path.
pub fn save_audit(result: &PipelineResult, path: &Path) -> Result<(), AuditError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_audit(result, &mut writer)?;
    writer.flush()?;
    tracing::info!(path = %path.display(), "Audit record saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use verdict_core::{
        DecisionResult, Judgment, LeakageVerdict, NarrationResult,
    };

    fn bounded_result() -> PipelineResult {
        let decision = DecisionResult {
            record_id: "OBS_AUDIT".to_string(),
            timestamp: Utc::now(),
            judgment: Judgment::BoundedValue { value: 6 },
            rationale: "Extracted from structural observation: 6".to_string(),
            raw_response: "6".to_string(),
            model: "phi3:mini".to_string(),
            latency: Duration::from_millis(850),
        };
        let narration = NarrationResult {
            record_id: "OBS_AUDIT".to_string(),
            timestamp: Utc::now(),
            explanation: "Six protrusion regions separated by five defects.".to_string(),
            leakage: LeakageVerdict::clean(),
            model: "mistral:instruct".to_string(),
            latency: Duration::from_millis(2400),
        };
        PipelineResult::from_stages(decision, Some(narration))
    }

    #[test]
    fn test_stable_field_names() {
        let mut buffer = Vec::new();
        write_audit(&bounded_result(), &mut buffer).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["record_id"], "OBS_AUDIT");
        assert_eq!(json["outcome"], "BOUNDED_VALUE");
        assert_eq!(json["value"], 6);
        assert_eq!(json["leaked"], false);
        assert!(json["judge_latency_s"].is_number());
        assert!(json["narration_latency_s"].is_number());
    }

    #[test]
    fn test_early_termination_row_has_nulls() {
        let decision = DecisionResult {
            record_id: "OBS_AUDIT".to_string(),
            timestamp: Utc::now(),
            judgment: Judgment::Halted,
            rationale: "Evidence source untraceable".to_string(),
            raw_response: "STOP".to_string(),
            model: "phi3:mini".to_string(),
            latency: Duration::from_millis(400),
        };
        let result = PipelineResult::from_stages(decision, None);

        let record = AuditRecord::from(&result);
        assert_eq!(record.outcome, "HALTED");
        assert_eq!(record.value, None);
        assert_eq!(record.explanation, None);
        assert_eq!(record.narrator_model, None);
        assert!(record.stopped_early);
    }

    #[test]
    fn test_audit_roundtrip() {
        let mut buffer = Vec::new();
        write_audit(&bounded_result(), &mut buffer).unwrap();

        let back: AuditRecord = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(back.value, Some(6));
        assert_eq!(back.judge_model, "phi3:mini");
    }
}
