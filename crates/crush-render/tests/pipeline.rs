//! End-to-end behavior of the render pipeline.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crush_render::{
    CrushConfig, CrushEngine, FilterError, IncludeCache, MapProvider, MemoryIncludeCache,
    ProviderError, ProviderRegistry, RequestContext, Value, VariableProvider,
};
use serde_json::json;

fn object(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn providers() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.add_static(
        "user",
        object(json!({
            "name": "Ann",
            "admin": true,
            "guest": "false",
            "visits": 1,
            "tags": ["rust", null, "web"],
        })),
    );
    registry
}

fn engine() -> CrushEngine {
    CrushEngine::builder().providers(providers()).build()
}

/// Counts how often include bodies are stored.
#[derive(Default)]
struct CountingCache {
    inner: MemoryIncludeCache,
    puts: AtomicUsize,
    hits: AtomicUsize,
}

impl IncludeCache for CountingCache {
    fn get(&self, directive: &str) -> Option<String> {
        let found = self.inner.get(directive);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        found
    }

    fn put(&self, directive: &str, body: String) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(directive, body);
    }

    fn clear(&self) {
        self.inner.clear();
    }
}

struct Offline;

impl VariableProvider for Offline {
    fn contains(&self, _name: &str) -> bool {
        true
    }

    fn get(&self, name: &str) -> Result<Value, ProviderError> {
        Err(ProviderError::lookup(name, "connection refused"))
    }

    fn get_all(&self) -> serde_json::Map<String, Value> {
        serde_json::Map::new()
    }
}

#[test]
fn variables_and_filters() {
    let mut ctx = RequestContext::new("/");
    let out = engine().render("<b>{{user.name}}</b> <i>{{user.name || UPPERCASE}}</i>", &mut ctx);
    assert_eq!(out, "<b>Ann</b> <i>ANN</i>");
}

#[test]
fn missing_field_renders_empty() {
    let mut ctx = RequestContext::new("/");
    assert_eq!(engine().render("[{{user.email}}]", &mut ctx), "[]");
}

#[test]
fn conditionals() {
    let e = engine();
    let mut ctx = RequestContext::new("/");
    assert_eq!(e.render("{#if user.admin}admin{/if}", &mut ctx), "admin");
    assert_eq!(e.render("{#if !user.admin}admin{/if}", &mut ctx), "");
    assert_eq!(e.render("{#if user.guest}guest{/if}", &mut ctx), "");
    assert_eq!(e.render("{#if user.visits}once{/if}", &mut ctx), "once");
    assert_eq!(
        e.render("{#if user.unknown}x{/if}", &mut ctx),
        "{#if user.unknown}x{/if}"
    );
}

#[test]
fn loops_keep_order_and_skip_nulls() {
    let mut ctx = RequestContext::new("/");
    let out = engine().render("<ul>{#foreach user.tags -> t}<li>{{t}}</li>{/foreach}</ul>", &mut ctx);
    assert_eq!(out, "<ul><li>rust</li><li>web</li></ul>");
}

#[test]
fn loop_over_all_fields() {
    let mut registry = ProviderRegistry::new();
    registry.add_static("nav", object(json!({"home": "/", "about": "/about", "blog": "/blog"})));
    let engine = CrushEngine::builder().providers(registry).build();

    let mut ctx = RequestContext::new("/");
    let out = engine.render("{#foreach nav.ALL -> link}{{link}} {/foreach}", &mut ctx);
    assert_eq!(out, "/ /about /blog ");
}

#[test]
fn macros_expand_with_padding() {
    let mut ctx = RequestContext::new("/");
    let doc = "{#macro badge label color}<span class=\"{{color}}\">{{label}}</span>{/macro}\
               #badge(\"new\" \"green\")# #badge(\"old\")#";
    assert_eq!(
        engine().render(doc, &mut ctx),
        "<span class=\"green\">new</span> <span class=\"\">old</span>"
    );
}

#[test]
fn metadata_round_trip() {
    let mut ctx = RequestContext::new("/");
    let doc = "{{:\n[title: Welcome]\n[layout: wide]\n:}}<title>{{meta.title}}</title>";
    let out = engine().render(doc, &mut ctx);

    assert_eq!(out, "<title>Welcome</title>");
    assert_eq!(ctx.get_meta("title"), Some("Welcome"));
    assert_eq!(ctx.get_meta("layout"), Some("wide"));
    let keys: Vec<&String> = ctx.meta().keys().collect();
    assert_eq!(keys, vec!["title", "layout"]);
}

#[test]
fn includes_are_read_once_and_styles_wrapped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("head.html"), "<meta charset=\"utf-8\">").unwrap();
    fs::write(dir.path().join("site.css"), "h1 { color: red; }").unwrap();

    let cache = Arc::new(CountingCache::default());
    let engine = CrushEngine::builder()
        .config(CrushConfig::default().with_include_root(dir.path()))
        .providers(providers())
        .include_cache(cache.clone())
        .build();

    let doc = "{{include:head.html}}{{include:site.css}}{{include:head.html}}";
    let mut ctx = RequestContext::new("/");
    let out = engine.render(doc, &mut ctx);

    assert_eq!(
        out,
        "<meta charset=\"utf-8\"><style>\nh1 { color: red; }\n</style><meta charset=\"utf-8\">"
    );
    assert_eq!(cache.puts.load(Ordering::SeqCst), 2);
    assert_eq!(cache.hits.load(Ordering::SeqCst), 1);

    fs::write(dir.path().join("head.html"), "changed").unwrap();
    let again = engine.render("{{include:head.html}}", &mut RequestContext::new("/"));
    assert_eq!(again, "<meta charset=\"utf-8\">");
    assert_eq!(cache.puts.load(Ordering::SeqCst), 2);
}

#[test]
fn included_fragments_are_rendered() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("greeting.html"),
        "{#if user.admin}Hello {{user.name}}{/if}",
    )
    .unwrap();
    let engine = CrushEngine::builder()
        .config(CrushConfig::default().with_include_root(dir.path()))
        .providers(providers())
        .build();

    let mut ctx = RequestContext::new("/");
    assert_eq!(engine.render("<p>{{include:greeting.html}}</p>", &mut ctx), "<p>Hello Ann</p>");
}

#[test]
fn missing_include_is_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let engine = CrushEngine::builder()
        .config(CrushConfig::default().with_include_root(dir.path()))
        .build();

    let mut ctx = RequestContext::new("/");
    let doc = "a {{include:absent.html}} b";
    assert_eq!(engine.render(doc, &mut ctx), doc);
    assert!(engine.include_cache().get("{{include:absent.html}}").is_none());
}

#[test]
fn failures_only_affect_their_directive() {
    let mut registry = providers();
    registry.add_factory("db", |_ctx: &RequestContext| -> Option<Box<dyn VariableProvider>> {
        Some(Box::new(Offline))
    });
    let mut filters = crush_render::FilterRegistry::with_builtins();
    filters.add("EXPLODE", |_field: &str, _value: Value| -> Result<Value, FilterError> {
        Err(FilterError::failed("EXPLODE", "boom"))
    });
    let engine = CrushEngine::builder().providers(registry).filters(filters).build();

    let mut ctx = RequestContext::new("/");
    let doc = "1:{{db.rows}} 2:{{user.name || NOSUCH}} 3:{{user.name || EXPLODE}} 4:{{user.name}}";
    assert_eq!(engine.render(doc, &mut ctx), "1: 2: 3: 4:Ann");
}

#[test]
fn request_scoped_providers() {
    let mut registry = ProviderRegistry::new();
    registry.add_factory("page", |ctx: &RequestContext| -> Option<Box<dyn VariableProvider>> {
        let locale = ctx.get_extra("locale")?;
        MapProvider::from_json(json!({"locale": locale}))
            .map(|p| Box::new(p) as Box<dyn VariableProvider>)
    });
    let engine = CrushEngine::builder().providers(registry).build();

    let mut en = RequestContext::new("/").with_extra("locale", "en");
    let mut none = RequestContext::new("/");
    assert_eq!(engine.render("[{{page.locale}}]", &mut en), "[en]");
    assert_eq!(engine.render("[{{page.locale}}]", &mut none), "[]");
}

#[test]
fn post_namespace_only_with_form_data() {
    let e = engine();
    let mut form = RequestContext::new("/login").with_post("user", "ann");
    let mut plain = RequestContext::new("/login");
    assert_eq!(e.render("{#if post.user}x{/if}{{post.user}}", &mut form), "ann");
    assert_eq!(e.render("{#if post.user}x{/if}[{{post.user}}]", &mut plain), "{#if post.user}x{/if}[]");
}

#[test]
fn rendered_output_is_stable() {
    let e = engine();
    let doc = "{{: [title: T] :}}{#foreach user.tags -> t}{{t}},{/foreach}{{user.name || LOWERCASE}}";
    let once = e.render(doc, &mut RequestContext::new("/"));
    let twice = e.render(&once, &mut RequestContext::new("/"));
    assert_eq!(once, "rust,web,ann");
    assert_eq!(once, twice);
}

#[test]
fn shared_engine_renders_concurrently() {
    let engine = Arc::new(engine());
    std::thread::scope(|s| {
        for i in 0..8 {
            let engine = Arc::clone(&engine);
            s.spawn(move || {
                let path = format!("/page/{}", i);
                let mut ctx = RequestContext::new(path.clone());
                let out = engine.render("{{: [n: x] :}}{{request.path}} {{user.name}}", &mut ctx);
                assert_eq!(out, format!("{} Ann", path));
                assert_eq!(ctx.get_meta("n"), Some("x"));
            });
        }
    });
}
