//! # verdict-runtime
//!
//! Two-stage LLM judgment pipeline over inference backends.
//!
//! The runtime wires two model-backed stages around the deterministic
//! core in `verdict-core`:
//!
//! - the **judge** classifies an observation record into a bounded
//!   value, an indeterminate result, or a halt - it alone holds
//!   decision authority;
//! - the **narrator** explains a bounded decision in free text and is
//!   audited for prior intrusion; it can never move the decision.
//!
//! The [`Pipeline`] orchestrator sequences the stages, terminates early
//! on non-bounded decisions, and copies the final judgment from the
//! judge verbatim.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use verdict_core::ObservationRecord;
//! use verdict_runtime::{OllamaBackend, Pipeline, PipelineConfig};
//!
//! let backend = Arc::new(OllamaBackend::new());
//! let pipeline = Pipeline::new(PipelineConfig::default(), backend);
//!
//! let record = ObservationRecord::from_json_str(&json)?;
//! let result = pipeline.execute(&record).await;
//! println!("{} -> {}", result.record_id, result.final_judgment);
//! ```

pub mod audit;
pub mod backend;
pub mod config;
pub mod judge;
pub mod narrator;
pub mod pin;
pub mod pipeline;
pub mod prompts;
pub mod retry;

pub use audit::{save_audit, write_audit, AuditError, AuditRecord};
pub use backend::{
    BackendError, BackendFactory, BackendRegistry, GenerateRequest, GenerateResponse,
    InferenceBackend, ERROR_SENTINEL,
};
pub use config::{PipelineConfig, StageConfig};
pub use judge::JudgeStage;
pub use narrator::NarratorStage;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use retry::RetryPolicy;

#[cfg(feature = "ollama")]
pub use backend::{OllamaBackend, OllamaBackendFactory};
