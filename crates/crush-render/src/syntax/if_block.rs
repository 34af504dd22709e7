//! `{#if Namespace.field}...{/if}` conditionals.

use regex::{Captures, Regex};

use super::{lookup, Lookup, Scope, Syntax};
use crate::value::is_truthy;

pattern!(
    IF,
    r"\{#if(?P<neg> !| )(?P<ns>[A-Za-z0-9_]+)\.(?P<field>[A-Za-z0-9_\-@]+)\}(?P<body>[\s\S]*?)\{/if\}"
);

/// Keeps or drops a block depending on a truthy field.
///
/// `{#if !ns.field}` inverts the test. A reference that cannot be resolved
/// leaves the whole directive in the output untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct IfBlock;

impl Syntax for IfBlock {
    fn name(&self) -> &'static str {
        "if"
    }

    fn pattern(&self) -> &Regex {
        &IF
    }

    fn process(&self, input: &str, scope: &mut Scope<'_>) -> String {
        IF.replace_all(input, |caps: &Captures| {
            let value = match lookup(scope, &caps["ns"], &caps["field"]) {
                Lookup::Found(value) => value,
                Lookup::Failed(err) => {
                    tracing::warn!(
                        namespace = &caps["ns"],
                        field = &caps["field"],
                        error = %err,
                        "failed to evaluate if condition"
                    );
                    return caps[0].to_string();
                }
                Lookup::Missing | Lookup::Unavailable => return caps[0].to_string(),
            };
            let negated = &caps["neg"] == " !";
            if is_truthy(&value) != negated {
                caps["body"].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
    }
}
