//! `{#foreach Namespace.field -> item}...{/foreach}` loops.

use regex::{Captures, Regex};

use super::{fetch, Lookup, Scope, Syntax};
use crate::value::{to_text, Value};

pattern!(
    FOREACH,
    r"\{#foreach (?P<ns>[A-Za-z0-9_]+)\.(?P<field>[A-Za-z0-9_\-@]+) -> (?P<item>[A-Za-z0-9_]+)\}(?P<body>[\s\S]*?)\{/foreach\}"
);

/// Field name that iterates over every value a provider exposes.
pub const ALL_FIELD: &str = "ALL";

/// Repeats the block body once per element of a sequence.
///
/// The block is removed when the namespace has no provider, the field is
/// missing, or the lookup fails. Null elements are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForEachBlock;

impl ForEachBlock {
    fn elements(scope: &Scope<'_>, namespace: &str, field: &str) -> Option<Vec<Value>> {
        let provider = scope.provider(namespace)?;
        if field.eq_ignore_ascii_case(ALL_FIELD) {
            return Some(provider.get_all().into_iter().map(|(_, v)| v).collect());
        }
        match fetch(provider.as_ref(), field) {
            Lookup::Found(Value::Array(items)) => Some(items),
            Lookup::Found(_) => Some(Vec::new()),
            Lookup::Failed(err) => {
                tracing::warn!(namespace, field, error = %err, "failed to finish the foreach loop");
                None
            }
            Lookup::Missing | Lookup::Unavailable => None,
        }
    }
}

impl Syntax for ForEachBlock {
    fn name(&self) -> &'static str {
        "foreach"
    }

    fn pattern(&self) -> &Regex {
        &FOREACH
    }

    fn process(&self, input: &str, scope: &mut Scope<'_>) -> String {
        FOREACH
            .replace_all(input, |caps: &Captures| {
                let Some(elements) = Self::elements(scope, &caps["ns"], &caps["field"]) else {
                    return String::new();
                };
                let placeholder = format!("{{{{{}}}}}", &caps["item"]);
                let body = &caps["body"];
                elements
                    .iter()
                    .filter(|element| !element.is_null())
                    .map(|element| body.replace(&placeholder, &to_text(element)))
                    .collect::<String>()
            })
            .into_owned()
    }
}
