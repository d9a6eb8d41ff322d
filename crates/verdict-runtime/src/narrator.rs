//! Narrator stage: explanation only, no decision authority.
//!
//! The narrator renders an explanation of a bounded decision from the
//! record's structural fields, then audits its own output for prior
//! intrusion. Its result can flag leakage or fail outright; neither
//! moves the pipeline's final judgment.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use verdict_core::{
    DecisionResult, LeakageDetector, LeakageVerdict, NarrationResult, ObservationRecord,
};

use crate::backend::{BackendError, InferenceBackend, ERROR_SENTINEL};
use crate::config::StageConfig;
use crate::prompts;
use crate::retry::generate_with_retry;

/// The narrator stage. Stateless: each invocation gets the record and
/// decision by reference and retains nothing.
pub struct NarratorStage {
    backend: Arc<dyn InferenceBackend>,
    config: StageConfig,
    detector: LeakageDetector,
}

impl NarratorStage {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: StageConfig) -> Self {
        Self {
            backend,
            config,
            detector: LeakageDetector::default(),
        }
    }

    /// Replace the leakage vocabulary (tests and domain ports).
    pub fn with_detector(mut self, detector: LeakageDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Explain a bounded decision.
    ///
    /// Callers must only pass bounded decisions; the orchestrator's
    /// sequencing guarantees it, and the stage debug-asserts it.
    pub async fn explain(
        &self,
        record: &ObservationRecord,
        decision: &DecisionResult,
    ) -> NarrationResult {
        debug_assert!(
            decision.judgment.is_bounded(),
            "narration requested for non-bounded decision"
        );

        let start = Instant::now();
        let prompt = prompts::render_narration_prompt(record, decision);
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
                let leakage = self.detector.detect(&response.text);
                if leakage.leaked {
                    tracing::warn!(
                        record_id = %record.record_id,
                        reason = %leakage.reason.as_deref().unwrap_or(""),
                        "Prior intrusion detected in narration"
                    );
                } else {
                    tracing::info!(
                        record_id = %record.record_id,
                        latency_ms = latency.as_millis() as u64,
                        model = %response.model,
                        "Narration rendered"
                    );
                }
                NarrationResult {
                    record_id: record.record_id.clone(),
                    timestamp: Utc::now(),
                    explanation: response.text,
                    leakage,
                    model: response.model,
                    latency,
                }
            }
            Err(e) => {
                // A failed narration is an audit gap, not a pipeline
                // failure; the decision stands either way.
                tracing::warn!(
                    record_id = %record.record_id,
                    error = %e,
                    "Narrator backend call failed"
                );
                NarrationResult {
                    record_id: record.record_id.clone(),
                    timestamp: Utc::now(),
                    explanation: ERROR_SENTINEL.to_string(),
                    leakage: LeakageVerdict::clean(),
                    model: self.config.model.clone(),
                    latency,
                }
            }
        }
    }
}
