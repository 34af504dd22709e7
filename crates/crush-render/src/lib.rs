//! # Crush Render - Template Resolution Pipeline
//!
//! `crush-render` rewrites HTML-ish template documents by resolving a small
//! directive language against request-scoped data. It is the rendering core
//! of the `crush` command-line tool but can be embedded in any server that
//! needs to resolve templates per request.
//!
//! ## Core Concepts
//!
//! - [`CrushEngine`]: runs the directive stages over a document
//! - [`RequestContext`]: per-request data, plus the metadata sink
//! - [`ProviderRegistry`]: namespace → [`ProviderFactory`] mapping
//! - [`FilterRegistry`]: named value transforms (`UPPERCASE`, `LIST`, ...)
//! - [`IncludeCache`]: memoized `{{include:...}}` bodies shared across passes
//!
//! ## Directives
//!
//! ```text
//! {{: [title: Home] :}}                              metadata
//! {#macro card t}<h2>{{t}}</h2>{/macro} #card("Hi")# macros
//! {{include:parts/nav.html}}                         includes
//! {#foreach items.list -> item}{{item}}{/foreach}    loops
//! {#if user.admin}...{/if}  {#if !user.admin}...{/if}
//! {{user.name}}  {{user.name || UPPERCASE}}          variables
//! ```
//!
//! Rendering never fails. A directive that cannot be resolved degrades on its
//! own (removed, emptied or left as-is, depending on the stage) and the rest
//! of the document renders normally.
//!
//! ## Quick Start
//!
//! ```rust
//! use crush_render::{CrushEngine, ProviderRegistry, RequestContext};
//! use serde_json::json;
//!
//! let mut providers = ProviderRegistry::new();
//! providers.add_static(
//!     "shop",
//!     json!({"name": "Corner", "items": ["tea", "cake"]}).as_object().cloned().unwrap(),
//! );
//! let engine = CrushEngine::builder().providers(providers).build();
//!
//! let template = r#"{{: [title: Menu] :}}<h1>{{shop.name || UPPERCASE}}</h1>
//! {#foreach shop.items -> item}<p>{{item}}</p>{/foreach}"#;
//!
//! let mut ctx = RequestContext::new("/menu");
//! let output = engine.render(template, &mut ctx);
//! assert_eq!(output, "<h1>CORNER</h1>\n<p>tea</p><p>cake</p>");
//! assert_eq!(ctx.get_meta("title"), Some("Menu"));
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use crush_render::{CrushConfig, CrushEngine};
//!
//! let config = CrushConfig::from_yaml("include_root: ./templates\ncache_includes: false\n").unwrap();
//! let engine = CrushEngine::builder().config(config).build();
//! assert!(!engine.config().cache_includes);
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod engine;
mod error;
pub mod filters;
pub mod provider;
pub mod syntax;
pub mod value;

pub use error::{ConfigError, CrushError, FilterError, ProviderError, Result};

pub use cache::{IncludeCache, MemoryIncludeCache};
pub use config::CrushConfig;
pub use context::RequestContext;
pub use engine::{CrushEngine, CrushEngineBuilder};
pub use filters::{register_filters, Filter, FilterRegistry};
pub use provider::{
    register_builtin_providers, CfgFactory, MapProvider, ProviderFactory, ProviderRegistry, StaticFactory,
    VariableProvider,
};
pub use syntax::Syntax;
pub use value::{is_truthy, to_text, Value};

/// Renders a document with a default engine.
///
/// Only the built-in namespaces (`request`, `get`, `post`, `meta`) are
/// available. Build a [`CrushEngine`] once and reuse it when rendering many
/// documents.
///
/// ```rust
/// use crush_render::{render, RequestContext};
///
/// let mut ctx = RequestContext::new("/docs").with_query("lang", "en");
/// assert_eq!(render("{{request.path}}?{{get.lang}}", &mut ctx), "/docs?en");
/// ```
pub fn render(document: &str, ctx: &mut RequestContext) -> String {
    CrushEngine::new().render(document, ctx)
}
