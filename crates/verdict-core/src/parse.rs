//! Response-decoding grammar for judge backend output.
//!
//! Free-form model output is decoded by a single total function with an
//! explicit token grammar: halt sentinel, indeterminate token, first
//! integer. Everything else falls back to indeterminate. The function is
//! backend-agnostic - weak backends echo the prompt or truncate, and the
//! same grammar applies either way.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Judgment;

/// Sentinel a backend emits when the evidence source is untraceable.
pub const HALT_SENTINEL: &str = "STOP";

/// Token a backend emits when the evidence is insufficient.
pub const INDETERMINATE_TOKEN: &str = "INDETERMINATE";

lazy_static! {
    /// Standalone integer tokens anywhere in the response. Small-capacity
    /// backends prepend filler text, so the first whitespace-delimited
    /// word is not enough.
    static ref INTEGER_TOKEN: Regex = Regex::new(r"\b\d+\b").expect("Invalid regex");
}

/// A decoded judgment plus the rationale the grammar attaches to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedJudgment {
    pub judgment: Judgment,
    pub rationale: String,
}

/// Decode a raw backend response into a judgment.
///
/// Priority order:
/// 1. Halt sentinel anywhere in the response (case-insensitive) wins,
///    even when digits are also present.
/// 2. Indeterminate token anywhere in the response.
/// 3. First standalone integer token.
/// 4. Fallback: indeterminate, rationale carries the first response line.
pub fn parse_judgment(response: &str) -> ParsedJudgment {
    let trimmed = response.trim();
    let upper = trimmed.to_uppercase();

    if upper.contains(HALT_SENTINEL) {
        return ParsedJudgment {
            judgment: Judgment::Halted,
            rationale: "Evidence source untraceable".to_string(),
        };
    }

    if upper.contains(INDETERMINATE_TOKEN) {
        return ParsedJudgment {
            judgment: Judgment::Indeterminate,
            rationale: "Insufficient evidence".to_string(),
        };
    }

    // First integer token that fits the value type; oversized digit runs
    // are skipped rather than wrapped.
    if let Some(value) = INTEGER_TOKEN
        .find_iter(trimmed)
        .filter_map(|m| m.as_str().parse::<u64>().ok())
        .next()
    {
        return ParsedJudgment {
            judgment: Judgment::BoundedValue { value },
            rationale: format!("Extracted from structural observation: {}", value),
        };
    }

    let first_line: String = trimmed
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(50)
        .collect();

    ParsedJudgment {
        judgment: Judgment::Indeterminate,
        rationale: format!("Parse failed: {}", first_line),
    }
}
