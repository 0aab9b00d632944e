use termrag_core::types::TermAnswer;
use tracing::warn;

pub const FALLBACK_TERM: &str = "Error";
pub const FALLBACK_DEFINITION: &str = "Failed to generate a proper response. Please try rephrasing your request.";

/// The answer returned whenever model output cannot be decoded.
pub fn fallback_answer() -> TermAnswer {
    TermAnswer::new(FALLBACK_TERM, FALLBACK_DEFINITION, "")
}

/// Decode raw model output into a [`TermAnswer`].
///
/// Accepts a JSON object with string `term`, `definition` and `example`
/// keys, optionally wrapped in a markdown code fence. Extra keys are
/// ignored. Anything else yields [`fallback_answer`].
pub fn parse(raw: &str) -> TermAnswer {
    let body = strip_fence(raw);
    match serde_json::from_str::<TermAnswer>(body) {
        Ok(answer) => answer,
        Err(e) => {
            let snippet: String = raw.chars().take(120).collect();
            warn!(error = %e, %snippet, "model output is not a valid answer object");
            fallback_answer()
        }
    }
}

fn strip_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening line.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
