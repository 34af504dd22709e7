//! Namespaces every engine knows about unless told otherwise.
//!
//! | Namespace | Exposes |
//! |-----------|---------|
//! | `request` | `path` plus the route variables |
//! | `get`     | query string parameters |
//! | `post`    | form parameters |
//! | `meta`    | document metadata recorded so far |
//! | `cfg`     | configuration variables as `section@key` |

use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::ProviderError;
use crate::value::{Map, Value};

use super::{MapProvider, ProviderFactory, ProviderRegistry, VariableProvider};

/// Exposes the request path and route variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFactory;

impl ProviderFactory for RequestFactory {
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        let mut provider = MapProvider::from_pairs(ctx.variables());
        provider
            .values
            .insert("path".to_string(), Value::String(ctx.path().to_string()));
        Some(Box::new(provider))
    }
}

/// Exposes query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFactory;

impl ProviderFactory for QueryFactory {
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        Some(Box::new(MapProvider::from_pairs(ctx.query())))
    }
}

/// Exposes form parameters. Declines when the request carries none.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFactory;

impl ProviderFactory for PostFactory {
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        if ctx.post().is_empty() {
            return None;
        }
        Some(Box::new(MapProvider::from_pairs(ctx.post())))
    }
}

/// Exposes the metadata written by `{{: ... :}}` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaFactory;

impl ProviderFactory for MetaFactory {
    fn provide(&self, ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        Some(Box::new(MapProvider::new(ctx.meta().clone())))
    }
}

/// Exposes configuration sections, addressed as `section@key`.
///
/// `ALL` flattens every section into `section@key` entries.
#[derive(Debug, Clone, Default)]
pub struct CfgFactory {
    sections: Arc<Map<String, Value>>,
}

impl CfgFactory {
    pub fn new(sections: Map<String, Value>) -> Self {
        Self {
            sections: Arc::new(sections),
        }
    }
}

impl ProviderFactory for CfgFactory {
    fn provide(&self, _ctx: &RequestContext) -> Option<Box<dyn VariableProvider>> {
        Some(Box::new(CfgProvider {
            sections: Arc::clone(&self.sections),
        }))
    }
}

struct CfgProvider {
    sections: Arc<Map<String, Value>>,
}

impl CfgProvider {
    fn lookup(&self, name: &str) -> Option<&Value> {
        let (section, key) = name.split_once('@')?;
        self.sections.get(section)?.as_object()?.get(key)
    }
}

impl VariableProvider for CfgProvider {
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    fn get(&self, name: &str) -> Result<Value, ProviderError> {
        self.lookup(name)
            .cloned()
            .ok_or_else(|| ProviderError::MissingField(name.to_string()))
    }

    fn get_all(&self) -> Map<String, Value> {
        let mut all = Map::new();
        for (section, values) in self.sections.iter() {
            let Some(values) = values.as_object() else {
                continue;
            };
            for (key, value) in values {
                all.insert(format!("{}@{}", section, key), value.clone());
            }
        }
        all
    }
}

/// Registers the built-in namespaces on a registry.
///
/// Factories registered afterwards under the same names replace these.
pub fn register_builtin_providers(registry: &mut ProviderRegistry) {
    registry.add_factory("request", RequestFactory);
    registry.add_factory("get", QueryFactory);
    registry.add_factory("post", PostFactory);
    registry.add_factory("meta", MetaFactory);
    registry.add_factory("cfg", CfgFactory::default());
}
