//! `{{include:path}}` fragments.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use regex::{Captures, Regex};

use super::{Scope, Syntax};
use crate::cache::IncludeCache;
use crate::config::CrushConfig;

pattern!(INCLUDE, r"\{\{include:(?P<path>[A-Za-z0-9_./\-]+)\}\}");

/// Replaces include directives with the contents of files below the include
/// root.
///
/// Missing files leave the directive in place and log a warning. Stylesheets
/// are wrapped in a `<style>` element. Resolved bodies are cached by the exact
/// directive text when caching is enabled.
pub struct Include {
    config: CrushConfig,
    cache: Arc<dyn IncludeCache>,
}

impl Include {
    pub fn new(config: &CrushConfig, cache: Arc<dyn IncludeCache>) -> Self {
        Self {
            config: config.clone(),
            cache,
        }
    }

    /// Maps a directive path onto the include root.
    ///
    /// Absolute paths and paths climbing out of the root resolve to nothing.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.config.include_root.join(relative))
    }

    fn load(&self, path: &str) -> Option<String> {
        let Some(file) = self.locate(path) else {
            tracing::warn!(path, "include path escapes the include root");
            return None;
        };
        if !file.is_file() {
            tracing::warn!(path, file = %file.display(), "couldn't find file for include");
            return None;
        }
        match std::fs::read(&file) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                if self.config.is_stylesheet(&file) {
                    Some(wrap_style(text))
                } else {
                    Some(text)
                }
            }
            Err(err) => {
                tracing::warn!(path, error = %err, "failed to read include");
                None
            }
        }
    }

    fn resolve(&self, directive: &str, path: &str) -> Option<String> {
        if self.config.cache_includes {
            if let Some(body) = self.cache.get(directive) {
                return Some(body);
            }
        }
        let body = self.load(path)?;
        if self.config.cache_includes {
            self.cache.put(directive, body.clone());
        }
        Some(body)
    }
}

fn wrap_style(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    format!("<style>\n{}</style>", text)
}

impl Syntax for Include {
    fn name(&self) -> &'static str {
        "include"
    }

    fn pattern(&self) -> &Regex {
        &INCLUDE
    }

    fn process(&self, input: &str, _scope: &mut Scope<'_>) -> String {
        INCLUDE
            .replace_all(input, |caps: &Captures| {
                let directive = &caps[0];
                self.resolve(directive, &caps["path"])
                    .unwrap_or_else(|| directive.to_string())
            })
            .into_owned()
    }
}

impl std::fmt::Debug for Include {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Include")
            .field("root", &self.config.include_root)
            .field("cache_includes", &self.config.cache_includes)
            .finish()
    }
}
