//! `{{Namespace.field}}` and `{{Namespace.field || FILTER}}` interpolation.

use std::sync::Arc;

use regex::{Captures, Regex};

use super::{lookup, Lookup, Scope, Syntax};
use crate::filters::FilterRegistry;
use crate::value::to_text;

pattern!(
    VARIABLE,
    r"\{\{(?P<ns>[A-Za-z0-9_]+)\.(?P<field>[A-Za-z0-9_\-@]+)(?:\s*\|\|\s*(?P<filter>[A-Za-z0-9_]+)\s*)?\}\}"
);

/// Replaces variable references with provider values.
///
/// Anything that stops a reference from producing a value (unknown
/// namespace, missing field, failing provider, unknown or failing filter)
/// replaces that reference with empty text. Other references are unaffected.
#[derive(Debug, Clone)]
pub struct Variable {
    filters: Arc<FilterRegistry>,
}

impl Variable {
    pub fn new(filters: Arc<FilterRegistry>) -> Self {
        Self { filters }
    }

    fn evaluate(&self, scope: &Scope<'_>, caps: &Captures<'_>) -> Option<String> {
        let (namespace, field) = (&caps["ns"], &caps["field"]);
        let value = match lookup(scope, namespace, field) {
            Lookup::Found(value) => value,
            Lookup::Failed(err) => {
                tracing::warn!(namespace, field, error = %err, "failed to resolve variable");
                return None;
            }
            Lookup::Missing => {
                tracing::debug!(namespace, field, "variable not provided");
                return None;
            }
            Lookup::Unavailable => return None,
        };
        let value = match caps.name("filter") {
            Some(filter) => match self.filters.apply(filter.as_str(), field, value) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(namespace, field, error = %err, "failed to apply filter");
                    return None;
                }
            },
            None => value,
        };
        Some(to_text(&value))
    }
}

impl Default for Variable {
    fn default() -> Self {
        Self::new(Arc::new(FilterRegistry::with_builtins()))
    }
}

impl Syntax for Variable {
    fn name(&self) -> &'static str {
        "variable"
    }

    fn pattern(&self) -> &Regex {
        &VARIABLE
    }

    fn process(&self, input: &str, scope: &mut Scope<'_>) -> String {
        VARIABLE
            .replace_all(input, |caps: &Captures| {
                self.evaluate(scope, caps).unwrap_or_default()
            })
            .into_owned()
    }
}
