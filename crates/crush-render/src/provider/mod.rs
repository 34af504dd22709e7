//! Variable providers and the namespace registry.
//!
//! Directives such as `{{user.name}}` or `{#foreach items.ALL -> x}` address a
//! *namespace* (`user`, `items`) and a *field* (`name`, `ALL`). Namespaces are
//! resolved through a [`ProviderRegistry`], which maps lowercase names to
//! [`ProviderFactory`] implementations. A factory is asked for a fresh
//! [`VariableProvider`] every time a directive is evaluated, so providers can
//! depend on the current [`RequestContext`].
//!
//! # Static vs Dynamic Providers
//!
//! - Static providers: expose the same values for every request
//!   ([`ProviderRegistry::add_static`])
//! - Dynamic providers: read the request context to decide what to expose
//!   (closures or custom [`ProviderFactory`] implementations)
//!
//! # Example
//!
//! ```rust
//! use crush_render::{MapProvider, ProviderRegistry, RequestContext, VariableProvider};
//! use serde_json::json;
//!
//! let mut registry = ProviderRegistry::new();
//! registry.add_static("site", json!({"name": "Acme"}).as_object().cloned().unwrap());
//! registry.add_factory("page", |ctx: &RequestContext| -> Option<Box<dyn VariableProvider>> {
//!     let values = json!({"path": ctx.path()});
//!     MapProvider::from_json(values).map(|p| Box::new(p) as Box<dyn VariableProvider>)
//! });
//!
//! let ctx = RequestContext::new("/about");
//! let page = registry.resolve("PAGE", &ctx).unwrap();
//! assert_eq!(page.get("path").unwrap(), json!("/about"));
//! ```

mod builtin;

pub use builtin::{
    register_builtin_providers, CfgFactory, MetaFactory, PostFactory, QueryFactory, RequestFactory,
};

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::ProviderError;
use crate::value::{Map, Value};

/// A request-scoped source of named values for one namespace.
pub trait VariableProvider {
    /// Does the provider expose this field?
    fn contains(&self, name: &str) -> bool;

    /// Looks up a field.
    ///
    /// Callers check [`contains`](Self::contains) first; a failing lookup is
    /// treated by every stage as an unresolvable reference.
    fn get(&self, name: &str) -> Result<Value, ProviderError>;

    /// Every field the provider exposes, in the provider's natural order.
    fn get_all(&self) -> Map<String, Value>;
}

/// Produces a [`VariableProvider`] for the current request.
///
/// Factories are registered once and shared between concurrent render passes,
/// hence the `Send + Sync` bound. Returning `None` means the namespace has
/// nothing to offer for this request.
///
/// A blanket implementation is provided for closures:
///
/// ```rust,ignore
/// registry.add_factory("clock", |_ctx: &RequestContext| -> Option<Box<dyn VariableProvider>> {
///     None
/// });
/// ```
pub trait ProviderFactory: Send + Sync {
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&RequestContext) -> Option<Box<dyn VariableProvider>> + Send + Sync,
{
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        (self)(ctx)
    }
}

/// A provider backed by an in-memory map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapProvider {
    values: Map<String, Value>,
}

impl MapProvider {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Builds a provider from a JSON object. Returns `None` for any other value.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    /// Builds a provider from string pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Self { values }
    }
}

impl VariableProvider for MapProvider {
    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get(&self, name: &str) -> Result<Value, ProviderError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::MissingField(name.to_string()))
    }

    fn get_all(&self) -> Map<String, Value> {
        self.values.clone()
    }
}

/// A factory that always hands out the same values.
#[derive(Debug, Clone)]
pub struct StaticFactory {
    values: Map<String, Value>,
}

impl StaticFactory {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl ProviderFactory for StaticFactory {
    fn provide(&self, _ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        Some(Box::new(MapProvider::new(self.values.clone())))
    }
}

/// Namespace → factory mapping consulted by every directive stage.
///
/// Names are case-insensitive: they are stored lowercase and looked up
/// lowercase. Registering a name twice replaces the earlier factory.
///
/// `ProviderRegistry` is cheap to clone since it stores factories as `Arc`.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in `request`, `get`, `post`,
    /// `meta` and (empty) `cfg` namespaces.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtin_providers(&mut registry);
        registry
    }

    /// Registers a factory under the given namespace.
    pub fn add_factory<F: ProviderFactory + 'static>(&mut self, name: impl AsRef<str>, factory: F) {
        self.factories
            .insert(name.as_ref().to_lowercase(), Arc::new(factory));
    }

    /// Registers a fixed set of values under the given namespace.
    pub fn add_static(&mut self, name: impl AsRef<str>, values: Map<String, Value>) {
        self.add_factory(name, StaticFactory::new(values));
    }

    /// Copies every factory from `other`, replacing same-named entries.
    pub fn merge(&mut self, other: &ProviderRegistry) {
        for (name, factory) in &other.factories {
            self.factories.insert(name.clone(), Arc::clone(factory));
        }
    }

    /// Asks the namespace's factory for a provider.
    ///
    /// Returns `None` when the namespace is unknown or its factory declines.
    pub fn resolve(&self, namespace: &str, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        let factory = self.factories.get(&namespace.to_lowercase());
        if factory.is_none() {
            tracing::debug!(namespace, "template requesting unknown variable factory");
        }
        factory?.provide(ctx)
    }

    /// Returns true if a factory is registered for the namespace.
    pub fn contains(&self, namespace: &str) -> bool {
        self.factories.contains_key(&namespace.to_lowercase())
    }

    /// Returns true if the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns the number of registered namespaces.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Gets the names of all registered namespaces.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
