//! Values exposed by variable providers.
//!
//! Providers hand out [`serde_json::Value`]s. Scalars are strings, numbers and
//! booleans; ordered sequences are arrays; `Null` stands for an absent value.

pub use serde_json::{Map, Value};

/// Formats a value as the text substituted into a document.
///
/// - Strings are used verbatim (no quotes)
/// - Numbers and booleans use their display form
/// - `Null` becomes empty text
/// - Arrays and objects use their compact JSON representation
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Coerces a value to a boolean for `{#if}` blocks.
///
/// In priority order: booleans are used directly, strings are true when equal
/// to `"true"` ignoring case, numbers are true only when exactly 1. Every
/// other value is false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i == 1
            } else if let Some(u) = n.as_u64() {
                u == 1
            } else {
                n.as_f64() == Some(1.0)
            }
        }
        _ => false,
    }
}
