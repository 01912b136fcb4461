//! Lenient JSON extraction from model output
//!
//! Models wrap JSON in prose or code fences. The object is taken to span
//! from the first `{` to the last `}`.

use serde_json::{Map, Value};

use crate::LlmError;

/// Slice from the first `{` to the last `}`, if both exist in that order
pub fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the JSON object embedded in `text`
pub fn parse_json_object(text: &str) -> Result<Map<String, Value>, LlmError> {
    let span = json_object_span(text)
        .ok_or_else(|| LlmError::InvalidResponse("No JSON object in response".to_string()))?;

    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::InvalidResponse(format!(
            "Expected a JSON object, got {}",
            type_name(&other)
        ))),
        Err(e) => Err(LlmError::InvalidResponse(e.to_string())),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
