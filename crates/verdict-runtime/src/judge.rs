//! Judge stage: the sole holder of decision authority.
//!
//! The judge turns an observation record into a classified decision by
//! rendering a minimal extraction prompt, calling the backend with
//! deterministic sampling, and decoding the response through the core
//! grammar. Transport failures downgrade to an indeterminate decision
//! with the failure as rationale - they never surface as errors.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use verdict_core::{parse_judgment, DecisionResult, Judgment, ObservationRecord};

use crate::backend::{BackendError, InferenceBackend, ERROR_SENTINEL};
use crate::config::StageConfig;
use crate::pin::RecordPins;
use crate::prompts;
use crate::retry::generate_with_retry;

/// The judge stage. Stateless apart from the pin registry; holds no
/// reference to pipeline state between invocations.
pub struct JudgeStage {
    backend: Arc<dyn InferenceBackend>,
    config: StageConfig,
    pins: RecordPins,
}

impl JudgeStage {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: StageConfig) -> Self {
        Self {
            backend,
            config,
            pins: RecordPins::new(),
        }
    }

    /// Classify a record.
    ///
    /// The record is pinned for the duration of the invocation so a
    /// concurrent judgment of the same id cannot interleave with this
    /// one. The stage renders a classification from the record's
    /// structural fields only.
    pub async fn classify(&self, record: &ObservationRecord) -> DecisionResult {
        let _pin = self.pins.pin(&record.record_id).await;
        let start = Instant::now();

        let prompt = prompts::render_judge_prompt(record);
        let request = self.config.generate_request(prompt);

        let outcome = tokio::time::timeout(
            request.timeout,
            generate_with_retry(self.backend.as_ref(), &request, &self.config.retry),
        )
        .await
        .unwrap_or(Err(BackendError::Timeout(request.timeout)));

        let latency = start.elapsed();

        match outcome {
            Ok(response) => {
                let parsed = parse_judgment(&response.text);
                tracing::info!(
                    record_id = %record.record_id,
                    outcome = %parsed.judgment,
                    latency_ms = latency.as_millis() as u64,
                    model = %response.model,
                    "Judgment rendered"
                );
                DecisionResult {
                    record_id: record.record_id.clone(),
                    timestamp: Utc::now(),
                    judgment: parsed.judgment,
                    rationale: parsed.rationale,
                    raw_response: response.text,
                    model: response.model,
                    latency,
                }
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %record.record_id,
                    error = %e,
                    "Judge backend call failed, downgrading to indeterminate"
                );
                DecisionResult {
                    record_id: record.record_id.clone(),
                    timestamp: Utc::now(),
                    judgment: Judgment::Indeterminate,
                    rationale: e.to_string(),
                    raw_response: ERROR_SENTINEL.to_string(),
                    model: self.config.model.clone(),
                    latency,
                }
            }
        }
    }
}
