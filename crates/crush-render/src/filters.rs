//! Value filters for variable interpolation.
//!
//! A filter is applied with `{{Namespace.field || NAME}}`. It receives the field
//! name and the raw provider value, and returns a new value that is then
//! stringified into the document.
//!
//! ## Built-in Filters
//!
//! - `UPPERCASE` - Uppercase the text form
//! - `LOWERCASE` - Lowercase the text form
//! - `LIST` - Render a sequence as `<ul id='list-field'><li>..</li></ul>`
//! - `JAVASCRIPT` - Emit `var field = <literal>;` safe to embed in a script
//!
//! Filter names are case-insensitive; they are stored uppercase.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FilterError;
use crate::value::{to_text, Value};

/// A named transform applied to an interpolated value.
pub trait Filter: Send + Sync {
    fn apply(&self, field: &str, value: Value) -> Result<Value, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&str, Value) -> Result<Value, FilterError> + Send + Sync,
{
    fn apply(&self, field: &str, value: Value) -> Result<Value, FilterError> {
        (self)(field, value)
    }
}

/// Name → filter mapping used by the variable stage.
#[derive(Default, Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with all built-in filters registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_filters(&mut registry);
        registry
    }

    /// Registers a filter, replacing any filter with the same name.
    pub fn add<F: Filter + 'static>(&mut self, name: impl AsRef<str>, filter: F) {
        self.filters
            .insert(name.as_ref().to_uppercase(), Arc::new(filter));
    }

    /// Applies the named filter to a value.
    pub fn apply(&self, name: &str, field: &str, value: Value) -> Result<Value, FilterError> {
        let filter = self
            .filters
            .get(&name.to_uppercase())
            .ok_or_else(|| FilterError::Unknown(name.to_string()))?;
        filter.apply(field, value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(&name.to_uppercase())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(|s| s.as_str())
    }
}

impl std::fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Registers all built-in filters on a registry.
pub fn register_filters(registry: &mut FilterRegistry) {
    registry.add("UPPERCASE", |_field: &str, value: Value| -> Result<Value, FilterError> {
        Ok(Value::String(to_text(&value).to_uppercase()))
    });

    registry.add("LOWERCASE", |_field: &str, value: Value| -> Result<Value, FilterError> {
        Ok(Value::String(to_text(&value).to_lowercase()))
    });

    registry.add("LIST", |field: &str, value: Value| -> Result<Value, FilterError> {
        Ok(Value::String(html_list(field, &value)))
    });

    registry.add("JAVASCRIPT", |field: &str, value: Value| -> Result<Value, FilterError> {
        Ok(Value::String(javascript_var(field, &value)))
    });
}

/// Renders a sequence as an unordered list. Non-sequences produce an empty list.
fn html_list(field: &str, value: &Value) -> String {
    let mut out = format!("<ul id='list-{}'>", field);
    if let Value::Array(items) = value {
        for item in items {
            out.push_str("<li>");
            out.push_str(&to_text(item));
            out.push_str("</li>");
        }
    }
    out.push_str("</ul>");
    out
}

/// Renders `var field = <literal>;`.
fn javascript_var(field: &str, value: &Value) -> String {
    let literal = match value {
        Value::Array(items) => {
            let elements: Vec<String> = items.iter().map(js_literal).collect();
            format!("[\n{}]", elements.join(",\n"))
        }
        other => js_literal(other),
    };
    format!("var {} = {};", field, literal)
}

fn js_literal(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => js_string(s),
        other => js_string(&to_text(other)),
    }
}

/// Quotes a string as a JSON literal, then escapes the characters that can
/// terminate a `<script>` element or a JS statement early.
fn js_string(s: &str) -> String {
    let quoted = Value::String(s.to_string()).to_string();
    let mut out = String::with_capacity(quoted.len());
    for ch in quoted.chars() {
        match ch {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out
}
