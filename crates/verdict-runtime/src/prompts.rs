//! Prompt rendering for the judge and narrator stages.
//!
//! Two rules shape these prompts:
//! 1. The judge sees ONLY the record's structural fields in plain
//!    key/value form - never the upstream input that produced them.
//! 2. The narrator receives the decision as read-only context and is
//!    told to self-report when it reaches past the supplied data.
//!
//! Keep the judge prompt minimal: it is tuned for small-capacity models
//! that follow a single extraction instruction but drift on anything
//! longer.

use verdict_core::{DecisionResult, ObservationRecord, LEAKAGE_SENTINEL};

/// Render a record as a concept-free measurement block.
pub fn render_observation(record: &ObservationRecord) -> String {
    format!(
        "Observation Record: {id}\n\
         \n\
         Structural Measurements:\n\
         - Estimated protrusions: {protrusions}\n\
         - Convexity defects: {defects}\n\
         - Contour area: {area:.0} px\n\
         - Hull points: {hull}\n\
         - Bounding box: {w} x {h}\n\
         - Aspect ratio: {ratio:.2}\n\
         \n\
         Processing method: {method}",
        id = record.record_id,
        protrusions = record.protrusions,
        defects = record.convexity_defects,
        area = record.contour_area,
        hull = record.hull_points,
        w = record.bbox_width,
        h = record.bbox_height,
        ratio = record.aspect_ratio,
        method = record.processing_method,
    )
}

/// Minimal extraction prompt for the judge stage.
pub fn render_judge_prompt(record: &ObservationRecord) -> String {
    format!(
        "Read the observation data and output the \"Estimated protrusions\" value.\n\
         \n\
         {observation}\n\
         \n\
         Output ONLY the number.\n\
         Answer:",
        observation = render_observation(record),
    )
}

/// Explanation prompt for the narrator stage. The decision is context,
/// not a question - the narrator holds no authority over it.
pub fn render_narration_prompt(record: &ObservationRecord, decision: &DecisionResult) -> String {
    format!(
        "You are an explanation generator. Describe how the decision was made \
         based on the observation data.\n\
         \n\
         CONTEXT:\n\
         OBSERVATION RECORD:\n\
         {observation}\n\
         \n\
         PRIMARY JUDGMENT (read-only):\n\
         - Outcome: {outcome}\n\
         - Value: {value}\n\
         - Rationale: {rationale}\n\
         \n\
         TASK:\n\
         Explain the decision using only the structural measurements provided.\n\
         Avoid concept labels - stick to structural terms.\n\
         If you rely on common sense or background knowledge, mention \
         {sentinel} explicitly.\n\
         \n\
         EXPLANATION:",
        observation = render_observation(record),
        outcome = decision.judgment.label(),
        value = decision
            .judgment
            .value()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string()),
        rationale = decision.rationale,
        sentinel = LEAKAGE_SENTINEL,
    )
}
