//! The render pipeline.
//!
//! [`CrushEngine`] owns the directive stages and the registries they consult,
//! and applies the stages in a fixed order to each document:
//!
//! 1. [`MetaBlock`]: metadata is recorded before anything else runs
//! 2. [`MacroSyntax`]: macros may expand into any later directive
//! 3. [`Include`]: included files may contain loops, conditionals and variables
//! 4. [`ForEachBlock`]
//! 5. [`IfBlock`]
//! 6. [`Variable`]
//!
//! An engine is immutable once built and can be shared between threads; the
//! per-request state lives in the [`RequestContext`] passed to
//! [`render`](CrushEngine::render).
//!
//! # Example
//!
//! ```rust
//! use crush_render::{CrushEngine, ProviderRegistry, RequestContext};
//! use serde_json::json;
//!
//! let mut providers = ProviderRegistry::new();
//! providers.add_static("user", json!({"name": "Ann"}).as_object().cloned().unwrap());
//!
//! let engine = CrushEngine::builder().providers(providers).build();
//! let mut ctx = RequestContext::new("/");
//! assert_eq!(engine.render("Hi {{user.name || UPPERCASE}}", &mut ctx), "Hi ANN");
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::cache::{IncludeCache, MemoryIncludeCache};
use crate::config::CrushConfig;
use crate::context::RequestContext;
use crate::error::{CrushError, Result};
use crate::filters::FilterRegistry;
use crate::provider::{CfgFactory, ProviderRegistry};
use crate::syntax::{ForEachBlock, IfBlock, Include, MacroSyntax, MetaBlock, Scope, Syntax, Variable};

/// Applies the directive stages to template documents.
pub struct CrushEngine {
    config: CrushConfig,
    stages: Vec<Box<dyn Syntax>>,
    providers: ProviderRegistry,
    cache: Arc<dyn IncludeCache>,
}

impl CrushEngine {
    /// Creates an engine with the default configuration, the built-in
    /// providers and the built-in filters.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CrushEngineBuilder {
        CrushEngineBuilder::default()
    }

    /// Renders one document for one request.
    ///
    /// Never fails: directives that cannot be resolved degrade locally (see
    /// the individual stages) and the rest of the document is still rendered.
    /// Metadata blocks are recorded on `ctx`.
    pub fn render(&self, document: &str, ctx: &mut RequestContext) -> String {
        if !self.config.enabled {
            return document.to_string();
        }
        if ctx.ignores_syntax() {
            tracing::trace!(path = ctx.path(), "request ignores template syntax");
            return document.to_string();
        }

        let mut text = document.to_string();
        let mut scope = Scope::new(ctx, &self.providers);
        for stage in &self.stages {
            if !stage.matches(&text) {
                continue;
            }
            tracing::trace!(stage = stage.name(), "running stage");
            text = stage.process(&text, &mut scope);
        }
        text
    }

    /// Reads a template file and renders it.
    pub fn render_file(&self, path: impl AsRef<Path>, ctx: &mut RequestContext) -> Result<String> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| CrushError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "rendering template file");
        Ok(self.render(&document, ctx))
    }

    /// The cache shared by include directives.
    pub fn include_cache(&self) -> &Arc<dyn IncludeCache> {
        &self.cache
    }

    pub fn config(&self) -> &CrushConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Names of the stages, in the order they run.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }
}

impl Default for CrushEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CrushEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrushEngine")
            .field("config", &self.config)
            .field("stages", &self.stage_names())
            .field("providers", &self.providers)
            .finish()
    }
}

/// Builder for [`CrushEngine`].
///
/// Providers registered here override built-in namespaces with the same name.
#[derive(Default)]
pub struct CrushEngineBuilder {
    config: CrushConfig,
    providers: ProviderRegistry,
    filters: Option<FilterRegistry>,
    cache: Option<Arc<dyn IncludeCache>>,
}

impl std::fmt::Debug for CrushEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrushEngineBuilder")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .field("filters", &self.filters)
            .field("custom_cache", &self.cache.is_some())
            .finish()
    }
}

impl CrushEngineBuilder {
    pub fn config(mut self, config: CrushConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.config(CrushConfig::from_file(path)?))
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Replaces the filter set. Defaults to [`FilterRegistry::with_builtins`].
    pub fn filters(mut self, filters: FilterRegistry) -> Self {
        self.filters = Some(filters);
        self
    }

    /// Uses a caller-supplied include cache instead of a fresh in-memory one.
    pub fn include_cache(mut self, cache: Arc<dyn IncludeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> CrushEngine {
        let providers = if self.config.builtin_providers {
            let mut registry = ProviderRegistry::with_builtins();
            registry.add_factory("cfg", CfgFactory::new(self.config.variables.clone()));
            registry.merge(&self.providers);
            registry
        } else {
            self.providers
        };
        let filters = Arc::new(self.filters.unwrap_or_else(FilterRegistry::with_builtins));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryIncludeCache::new()));

        let stages: Vec<Box<dyn Syntax>> = vec![
            Box::new(MetaBlock),
            Box::new(MacroSyntax),
            Box::new(Include::new(&self.config, Arc::clone(&cache))),
            Box::new(ForEachBlock),
            Box::new(IfBlock),
            Box::new(Variable::new(filters)),
        ];
        tracing::debug!(
            namespaces = providers.len(),
            include_root = %self.config.include_root.display(),
            "built crush engine"
        );

        CrushEngine {
            config: self.config,
            stages,
            providers,
            cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::value::{Map, Value};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn engine() -> CrushEngine {
        let mut providers = ProviderRegistry::new();
        providers.add_static(
            "user",
            object(json!({"name": "Ann", "admin": true, "tags": ["x", "y"]})),
        );
        CrushEngine::builder().providers(providers).build()
    }

    #[test]
    fn stage_order() {
        assert_eq!(
            engine().stage_names(),
            vec!["meta", "macro", "include", "foreach", "if", "variable"]
        );
    }

    #[test]
    fn renders_variables() {
        let mut ctx = RequestContext::new("/");
        assert_eq!(engine().render("Hi {{user.name}}", &mut ctx), "Hi Ann");
    }

    #[test]
    fn plain_text_is_unchanged() {
        let mut ctx = RequestContext::new("/");
        let text = "<p>No directives { here } [at: all]</p>";
        assert_eq!(engine().render(text, &mut ctx), text);
    }

    #[test]
    fn macro_expands_into_later_directives() {
        let mut ctx = RequestContext::new("/");
        let doc = "{#macro hello who}Hello {{who}} from {{user.name}}{/macro}#hello(\"Bob\")#";
        assert_eq!(engine().render(doc, &mut ctx), "Hello Bob from Ann");
    }

    #[test]
    fn loop_feeds_conditional_and_variables() {
        let mut ctx = RequestContext::new("/");
        let doc = "{#foreach user.tags -> t}[{{t}}]{/foreach}{#if user.admin}{{user.name}}{/if}";
        assert_eq!(engine().render(doc, &mut ctx), "[x][y]Ann");
    }

    #[test]
    fn metadata_is_visible_to_meta_namespace() {
        let mut ctx = RequestContext::new("/");
        let out = engine().render("{{: [title: Home] :}}<title>{{meta.title}}</title>", &mut ctx);
        assert_eq!(out, "<title>Home</title>");
        assert_eq!(ctx.get_meta("title"), Some("Home"));
    }

    #[test]
    fn builtin_request_namespace() {
        let mut ctx = RequestContext::new("/about").with_query("q", "rust");
        let out = engine().render("{{request.path}} {{get.q}}", &mut ctx);
        assert_eq!(out, "/about rust");
    }

    #[test]
    fn cfg_namespace_reads_config_variables() {
        let config = CrushConfig::from_yaml(
            "variables:\n  core:\n    port: 8080\n    debug: true\n  site:\n    name: Corner\n",
        )
        .unwrap();
        let engine = CrushEngine::builder().config(config).build();

        let mut ctx = RequestContext::new("/");
        assert_eq!(engine.render("[{{cfg.core@port}}]", &mut ctx), "[8080]");
        assert_eq!(engine.render("{#if cfg.core@debug}dbg{/if}", &mut ctx), "dbg");
        assert_eq!(engine.render("[{{cfg.core@nope}}]", &mut ctx), "[]");
        assert_eq!(
            engine.render("{#foreach cfg.ALL -> v}{{v}};{/foreach}", &mut ctx),
            "8080;true;Corner;"
        );
    }

    #[test]
    fn user_provider_overrides_builtin() {
        let mut providers = ProviderRegistry::new();
        providers.add_static("request", object(json!({"path": "overridden"})));
        let engine = CrushEngine::builder().providers(providers).build();

        let mut ctx = RequestContext::new("/about");
        assert_eq!(engine.render("{{request.path}}", &mut ctx), "overridden");
    }

    #[test]
    fn builtins_can_be_disabled() {
        let config = CrushConfig {
            builtin_providers: false,
            ..CrushConfig::default()
        };
        let engine = CrushEngine::builder().config(config).build();
        let mut ctx = RequestContext::new("/about");
        assert_eq!(engine.render("[{{request.path}}]", &mut ctx), "[]");
        assert!(engine.providers().is_empty());
    }

    #[test]
    fn disabled_engine_returns_input() {
        let config = CrushConfig {
            enabled: false,
            ..CrushConfig::default()
        };
        let engine = CrushEngine::builder().config(config).build();
        let mut ctx = RequestContext::new("/");
        let doc = "{{: [title: x] :}}{{request.path}}";
        assert_eq!(engine.render(doc, &mut ctx), doc);
        assert!(ctx.meta().is_empty());
    }

    #[test]
    fn ignoring_request_returns_input() {
        let mut ctx = RequestContext::new("/").ignoring_syntax();
        let doc = "{{user.name}}";
        assert_eq!(engine().render(doc, &mut ctx), doc);
    }

    #[test]
    fn custom_filters_replace_builtins() {
        let mut filters = FilterRegistry::new();
        filters.add("REVERSE", |_field: &str, value: Value| -> std::result::Result<Value, FilterError> {
            Ok(Value::String(crate::value::to_text(&value).chars().rev().collect()))
        });
        let mut providers = ProviderRegistry::new();
        providers.add_static("user", object(json!({"name": "Ann"})));
        let engine = CrushEngine::builder().providers(providers).filters(filters).build();

        let mut ctx = RequestContext::new("/");
        assert_eq!(
            engine.render("{{user.name || REVERSE}}|{{user.name || UPPERCASE}}", &mut ctx),
            "nnA|"
        );
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crush.yaml");
        std::fs::write(&file, "enabled: false\n").unwrap();

        let engine = CrushEngine::builder().config_file(&file).unwrap().build();
        assert!(!engine.config().enabled);
        assert_eq!(engine.config().include_root, dir.path());
    }

    #[test]
    fn bad_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crush.yaml");
        std::fs::write(&file, "enabled: [nope\n").unwrap();

        let err = CrushEngine::builder().config_file(&file).unwrap_err();
        assert!(matches!(err, CrushError::Config(_)));
        assert!(CrushEngine::builder().config_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn render_file_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<p>{{user.name}}</p>").unwrap();

        let mut ctx = RequestContext::new("/");
        assert_eq!(engine().render_file(&file, &mut ctx).unwrap(), "<p>Ann</p>");

        let err = engine()
            .render_file(dir.path().join("absent.html"), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, CrushError::Template { .. }));
        assert!(err.to_string().contains("absent.html"));
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CrushEngine>();
    }
}
