//! Pulls a [`Feedback`] object out of free-form model output.

use super::advisor::AdvisorError;
use super::feedback::Feedback;

/// Return the first top-level `{ … }` block in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count toward nesting. Returns `None` when no block closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse model output into a complete [`Feedback`].
pub fn parse_feedback(text: &str) -> Result<Feedback, AdvisorError> {
    let json = extract_json_object(text)
        .ok_or_else(|| AdvisorError::Parse("no JSON object in reply".into()))?;
    let feedback: Feedback =
        serde_json::from_str(json).map_err(|e| AdvisorError::Parse(e.to_string()))?;
    if !feedback.is_complete() {
        return Err(AdvisorError::Incomplete);
    }
    Ok(feedback)
}
