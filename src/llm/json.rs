//! JSON extraction from free-form model output

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use super::LlmError;

fn fence_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?").expect("valid regex"))
}

fn object_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Parse a JSON object from model output.
///
/// Accepts bare JSON, a ```json fenced block, or prose with the object
/// embedded somewhere in it (outermost braces win).
pub fn extract_json(content: &str) -> Result<Map<String, Value>, LlmError> {
    let mut cleaned = content.trim();
    if cleaned.starts_with("```") {
        cleaned = match fence_open().find(cleaned) {
            Some(m) => cleaned[m.end()..].trim(),
            None => cleaned,
        };
        if let Some(stripped) = cleaned.strip_suffix("```") {
            cleaned = stripped.trim();
        }
    }

    if let Ok(Value::Object(map)) = serde_json::from_str(cleaned) {
        return Ok(map);
    }

    let span = object_span()
        .find(cleaned)
        .ok_or_else(|| LlmError::InvalidJson(preview(content)))?;
    match serde_json::from_str(span.as_str()) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(LlmError::InvalidJson(preview(content))),
    }
}

fn preview(content: &str) -> String {
    let trimmed = content.trim();
    match trimmed.char_indices().nth(80) {
        Some((i, _)) => format!("{}...", &trimmed[..i]),
        None => trimmed.to_string(),
    }
}
