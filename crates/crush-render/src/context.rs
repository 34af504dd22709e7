//! The request-like context a render pass runs against.
//!
//! The engine treats the context as opaque except for two things:
//!
//! 1. It is the argument handed to every [`ProviderFactory`](crate::ProviderFactory),
//!    so request-scoped providers can read the path, parameters and extras.
//! 2. It is the metadata sink: the `{{: [key: value] :}}` block stage calls
//!    [`RequestContext::add_meta`] for every entry it finds.
//!
//! # Example
//!
//! ```rust
//! use crush_render::RequestContext;
//!
//! let mut ctx = RequestContext::new("/users/ann")
//!     .with_query("page", "2")
//!     .with_extra("locale", "en");
//!
//! ctx.add_meta("title", "Profile");
//!
//! assert_eq!(ctx.query().get("page").map(String::as_str), Some("2"));
//! assert_eq!(ctx.get_meta("title"), Some("Profile"));
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::value::{Map, Value};

/// Information about the request being rendered.
///
/// # Fields
///
/// - `path`: The request path
/// - `variables`: Route variables captured for the request
/// - `query`: Query string (`GET`) parameters
/// - `post`: Form (`POST`) parameters
/// - `extras`: Free-form string pairs for embedders
/// - `meta`: Document metadata written during rendering
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    path: String,
    variables: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    post: BTreeMap<String, String>,
    extras: HashMap<String, String>,
    meta: Map<String, Value>,
    ignore_syntax: bool,
}

impl RequestContext {
    /// Creates a context for the given request path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a route variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Adds a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Adds a form parameter.
    pub fn with_post(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.insert(key.into(), value.into());
        self
    }

    /// Adds an extra key-value pair to the context.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Marks the request as exempt from template processing.
    ///
    /// [`CrushEngine::render`](crate::CrushEngine::render) returns the document
    /// unchanged for such requests.
    pub fn ignoring_syntax(mut self) -> Self {
        self.ignore_syntax = true;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn post(&self) -> &BTreeMap<String, String> {
        &self.post
    }

    /// Gets an extra value by key.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(|s| s.as_str())
    }

    pub fn ignores_syntax(&self) -> bool {
        self.ignore_syntax
    }

    /// Records a document metadata entry.
    ///
    /// A repeated key overwrites the earlier value but keeps its position.
    pub fn add_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), Value::String(value.into()));
    }

    /// Gets a metadata value by key.
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    /// All metadata recorded so far, in declaration order.
    pub fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }
}
