//! Routine text extraction policy
//!
//! Backends have answered in several shapes over time. Each extractor
//! knows one shape; they are tried in order and the first non-empty
//! string wins.

use serde_json::Value;

pub type Extractor = fn(&Value) -> Option<&str>;

/// Ordered (name, extractor) pairs used on backend proxy responses
pub const ROUTINE_TEXT_EXTRACTORS: &[(&str, Extractor)] = &[
    ("routine", routine_field),
    ("text", text_field),
    ("result", result_field),
    ("choices", completion_choice),
];

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn routine_field(v: &Value) -> Option<&str> {
    non_empty(v.get("routine"))
}

fn text_field(v: &Value) -> Option<&str> {
    non_empty(v.get("text"))
}

fn result_field(v: &Value) -> Option<&str> {
    non_empty(v.get("result"))
}

/// `choices[0].message.content`
pub fn completion_choice(v: &Value) -> Option<&str> {
    non_empty(v.pointer("/choices/0/message/content"))
}

/// First usable routine text, along with the name of the extractor that found it
pub fn routine_text(response: &Value) -> Option<(&'static str, String)> {
    ROUTINE_TEXT_EXTRACTORS
        .iter()
        .find_map(|(name, extract)| extract(response).map(|text| (*name, text.to_string())))
}

/// Error indicator in a backend response, if any
pub fn error_indicator(response: &Value) -> Option<String> {
    match response.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}
