#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Turns the model's free-form reply into a [`GradingResult`].
//!
//! The grading prompt asks for bare JSON, but models regularly wrap it in a
//! markdown code block anyway. The fences are stripped before decoding, and
//! anything that still fails to decode becomes a degraded result carrying
//! the raw reply, so the grader can always read what the model said.

use crate::types::GradingResult;

/// Feedback placed in a degraded result when the reply is not valid JSON.
pub const PARSE_FAILURE_FEEDBACK: &str = "解析失敗，請查看詳細結果";

/// How decoded scores are treated before being handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScorePolicy {
    /// Keep whatever the model produced, even outside `[0, 100]`.
    #[default]
    PassThrough,
    /// Clamp into `[0, 100]`; NaN and infinities become `0`.
    Clamp,
}

impl ScorePolicy {
    /// Applies the policy to a decoded score.
    pub fn apply(self, score: f64) -> f64 {
        match self {
            ScorePolicy::PassThrough => score,
            ScorePolicy::Clamp if !score.is_finite() => 0.0,
            ScorePolicy::Clamp => score.clamp(0.0, 100.0),
        }
    }
}

/// Removes one opening fence (with an optional language tag such as `json`)
/// and one closing fence, then trims.
///
/// Either fence may be missing; text without fences is only trimmed. A
/// leading byte order mark counts as whitespace.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim().trim_start_matches('\u{feff}').trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        text = rest[tag_len..].trim();
    }

    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Result returned when the reply cannot be decoded.
pub fn degraded_result(raw: &str) -> GradingResult {
    GradingResult {
        student_name:    String::new(),
        score:           0.0,
        feedback:        PARSE_FAILURE_FEEDBACK.to_string(),
        detailed_result: raw.to_string(),
    }
}

/// Interprets a reply, passing scores through unchanged.
pub fn interpret(raw: &str) -> GradingResult {
    interpret_with(raw, ScorePolicy::PassThrough)
}

/// Interprets a reply under the given score policy. Never fails.
pub fn interpret_with(raw: &str, policy: ScorePolicy) -> GradingResult {
    match serde_json::from_str::<GradingResult>(strip_code_fences(raw)) {
        Ok(mut result) => {
            result.score = policy.apply(result.score);
            result
        }
        Err(e) => {
            tracing::warn!("Could not parse grading response as JSON: {e}");
            degraded_result(raw)
        }
    }
}
