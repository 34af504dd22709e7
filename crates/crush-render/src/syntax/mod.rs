//! Directive stages.
//!
//! Each stage recognizes one directive pattern and rewrites every matched span
//! of the current document. Stages run in a fixed order (see
//! [`CrushEngine`](crate::CrushEngine)):
//!
//! | Order | Stage | Grammar |
//! |-------|-------|---------|
//! | 1 | [`MetaBlock`] | `{{: [key: value] ... :}}` |
//! | 2 | [`MacroSyntax`] | `{#macro name p1 p2}body{/macro}` and `#name("a1" "a2")#` |
//! | 3 | [`Include`] | `{{include:path}}` |
//! | 4 | [`ForEachBlock`] | `{#foreach ns.field -> item}body{/foreach}` |
//! | 5 | [`IfBlock`] | `{#if ns.field}body{/if}`, `{#if !ns.field}body{/if}` |
//! | 6 | [`Variable`] | `{{ns.field}}`, `{{ns.field \|\| FILTER}}` |
//!
//! Occurrences are rewritten by position: every match is evaluated on its
//! own, left to right, and a directive that resolves to "leave as-is" is
//! copied through verbatim. Text without a match passes through unchanged.

/// Compiles one of the stage patterns.
macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
            regex::Regex::new($re).expect(concat!("valid ", stringify!($name), " regex"))
        });
    };
}

mod foreach;
mod if_block;
mod include;
mod macros;
mod meta_block;
mod variable;

pub use foreach::ForEachBlock;
pub use if_block::IfBlock;
pub use include::Include;
pub use macros::MacroSyntax;
pub use meta_block::MetaBlock;
pub use variable::Variable;

use regex::Regex;

use crate::context::RequestContext;
use crate::error::ProviderError;
use crate::provider::{ProviderRegistry, VariableProvider};
use crate::value::Value;

/// What a stage can see during one render pass.
pub struct Scope<'a> {
    pub context: &'a mut RequestContext,
    pub providers: &'a ProviderRegistry,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a mut RequestContext, providers: &'a ProviderRegistry) -> Self {
        Self { context, providers }
    }

    /// Asks the registry for the namespace's provider for this request.
    pub fn provider(&self, namespace: &str) -> Option<Box<dyn VariableProvider>> {
        self.providers.resolve(namespace, &*self.context)
    }
}

/// A directive stage.
pub trait Syntax: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// The pattern identifying this stage's directive.
    fn pattern(&self) -> &Regex;

    /// Returns true if the input holds at least one directive for this stage.
    fn matches(&self, input: &str) -> bool {
        self.pattern().is_match(input)
    }

    /// Rewrites every directive occurrence in `input`.
    fn process(&self, input: &str, scope: &mut Scope<'_>) -> String;
}

/// Outcome of looking up `namespace.field`.
#[derive(Debug)]
pub(crate) enum Lookup {
    /// No factory for the namespace, or the factory declined.
    Unavailable,
    /// The provider does not contain the field.
    Missing,
    /// The provider failed while producing the value.
    Failed(ProviderError),
    Found(Value),
}

/// Looks up a field on a provider, folding the contains/get protocol into one
/// result.
pub(crate) fn fetch(provider: &dyn VariableProvider, field: &str) -> Lookup {
    if !provider.contains(field) {
        return Lookup::Missing;
    }
    match provider.get(field) {
        Ok(value) => Lookup::Found(value),
        Err(err) => Lookup::Failed(err),
    }
}

pub(crate) fn lookup(scope: &Scope<'_>, namespace: &str, field: &str) -> Lookup {
    match scope.provider(namespace) {
        Some(provider) => fetch(provider.as_ref(), field),
        None => Lookup::Unavailable,
    }
}
