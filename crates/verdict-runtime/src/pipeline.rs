//! Pipeline orchestrator: sequencing, early termination, and decision
//! authority.
//!
//! The orchestrator runs judge-then-narrator over one record and owns
//! the two properties the rest of the system leans on:
//!
//! 1. **Authority**: the final judgment is copied from the judge stage
//!    verbatim, no matter what the narration stage returns - leakage,
//!    garbage, or transport failure included.
//! 2. **Early termination**: the narrator is never invoked unless the
//!    judge produced a bounded value. This is mandatory sequencing, not
//!    an optimization.
//!
//! A repeatability check re-executes the pipeline over the same record
//! and reports whether the judge's outcome held steady. Mismatches are
//! reported, never auto-corrected.

use std::sync::Arc;

use verdict_core::{
    ConsistencyReport, LeakageDetector, Judgment, ObservationRecord, PipelineResult,
};

use crate::backend::{BackendError, InferenceBackend};
use crate::config::PipelineConfig;
use crate::judge::JudgeStage;
use crate::narrator::NarratorStage;

/// Sequencing states of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Start,
    Decided,
    Explained,
    Done,
}

impl RunState {
    /// Step to the next state, asserting the transition is legal.
    /// Narration is reachable only from `Decided`; `Done` from
    /// `Decided` (early termination) or `Explained`.
    fn advance(self, next: RunState) -> RunState {
        debug_assert!(
            matches!(
                (self, next),
                (RunState::Start, RunState::Decided)
                    | (RunState::Decided, RunState::Explained)
                    | (RunState::Decided, RunState::Done)
                    | (RunState::Explained, RunState::Done)
            ),
            "illegal pipeline transition {:?} -> {:?}",
            self,
            next
        );
        next
    }
}

/// The two-stage judgment pipeline.
pub struct Pipeline {
    judge: JudgeStage,
    narrator: NarratorStage,
    repeat_runs: usize,
}

impl Pipeline {
    /// Build a pipeline with one backend serving both stages, the
    /// common single-server deployment.
    pub fn new(config: PipelineConfig, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            judge: JudgeStage::new(Arc::clone(&backend), config.judge.clone()),
            narrator: NarratorStage::new(backend, config.narrator.clone()),
            repeat_runs: config.repeat_runs,
        }
    }

    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Configured repeatability iteration count.
    pub fn repeat_runs(&self) -> usize {
        self.repeat_runs
    }

    /// Execute one pipeline run.
    ///
    /// Always returns a well-formed result; backend unavailability
    /// surfaces as an indeterminate or halted final judgment with a
    /// rationale, never as an error.
    pub async fn execute(&self, record: &ObservationRecord) -> PipelineResult {
        let mut state = RunState::Start;
        tracing::info!(record_id = %record.record_id, "Pipeline run started");

        let decision = self.judge.classify(record).await;
        state = state.advance(RunState::Decided);

        let narration = if decision.judgment.is_bounded() {
            let narration = self.narrator.explain(record, &decision).await;
            state = state.advance(RunState::Explained);
            Some(narration)
        } else {
            tracing::warn!(
                record_id = %record.record_id,
                outcome = %decision.judgment,
                "Early termination, narration skipped"
            );
            None
        };

        let result = PipelineResult::from_stages(decision, narration);
        state = state.advance(RunState::Done);
        debug_assert_eq!(state, RunState::Done);

        tracing::info!(
            record_id = %record.record_id,
            outcome = %result.final_judgment,
            stopped_early = result.stopped_early,
            leakage = result.leakage_detected(),
            "Pipeline run complete"
        );
        result
    }

    /// Execute `runs` times over the same record and compare the final
    /// judgments. Iterations run sequentially, each judge-then-narrate
    /// internally; the most recent result is returned alongside the
    /// report.
    pub async fn execute_with_repeatability(
        &self,
        record: &ObservationRecord,
        runs: usize,
    ) -> (PipelineResult, ConsistencyReport) {
        let runs = runs.max(1);
        let mut observed = Vec::with_capacity(runs);
        let mut last = None;

        for run in 1..=runs {
            tracing::info!(record_id = %record.record_id, run, runs, "Repeatability run");
            let result = self.execute(record).await;
            observed.push(result.final_judgment);
            last = Some(result);
        }

        let report = ConsistencyReport::from_observations(observed);
        if !report.consistent {
            tracing::warn!(
                record_id = %record.record_id,
                observed = ?report.observed,
                "Repeatability check failed"
            );
        }

        // runs >= 1, so at least one result was produced
        (last.expect("at least one run"), report)
    }
}

/// Builder for [`Pipeline`], for deployments that split the stages
/// across backends or swap the leakage vocabulary.
pub struct PipelineBuilder {
    config: PipelineConfig,
    judge_backend: Option<Arc<dyn InferenceBackend>>,
    narrator_backend: Option<Arc<dyn InferenceBackend>>,
    detector: Option<LeakageDetector>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            judge_backend: None,
            narrator_backend: None,
            detector: None,
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one backend for both stages.
    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.judge_backend = Some(Arc::clone(&backend));
        self.narrator_backend = Some(backend);
        self
    }

    pub fn judge_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.judge_backend = Some(backend);
        self
    }

    pub fn narrator_backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.narrator_backend = Some(backend);
        self
    }

    pub fn leakage_detector(mut self, detector: LeakageDetector) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn build(self) -> Result<Pipeline, BackendError> {
        let judge_backend = self
            .judge_backend
            .ok_or_else(|| BackendError::NotConfigured("No judge backend set".to_string()))?;
        let narrator_backend = self
            .narrator_backend
            .ok_or_else(|| BackendError::NotConfigured("No narrator backend set".to_string()))?;

        let judge = JudgeStage::new(judge_backend, self.config.judge.clone());
        let mut narrator = NarratorStage::new(narrator_backend, self.config.narrator.clone());
        if let Some(detector) = self.detector {
            narrator = narrator.with_detector(detector);
        }

        Ok(Pipeline {
            judge,
            narrator,
            repeat_runs: self.config.repeat_runs,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
