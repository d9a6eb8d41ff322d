//! # verdict-core
//!
//! Deterministic domain layer for the two-stage judgment pipeline.
//!
//! This crate holds everything that must stay auditable without a model
//! in the loop: the observation record, the response-decoding grammar,
//! the prior-intrusion detector, and the result types whose shapes
//! enforce the pipeline's invariants.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input always produces same output
//! 2. **No LLM calls**: decoding and leakage detection are pure text
//!    classification
//! 3. **Authority by construction**: [`PipelineResult::from_stages`] is
//!    the only way to build a run result, and it copies the final
//!    judgment from the decision stage verbatim
//!
//! ## Example
//!
//! ```rust
//! use verdict_core::{parse_judgment, Judgment};
//!
//! let parsed = parse_judgment("The output of this observation is 7");
//! assert_eq!(parsed.judgment, Judgment::BoundedValue { value: 7 });
//! ```

pub mod leakage;
pub mod parse;
pub mod record;
pub mod types;

// Re-export main types at crate root
pub use leakage::{LeakageDetector, LeakageVerdict, LEAKAGE_SENTINEL};
pub use parse::{parse_judgment, ParsedJudgment, HALT_SENTINEL, INDETERMINATE_TOKEN};
pub use record::{ObservationRecord, RecordError};
pub use types::{ConsistencyReport, DecisionResult, Judgment, NarrationResult, PipelineResult};
