//! Engine configuration.
//!
//! Configuration is plain data, usually loaded from YAML:
//!
//! ```yaml
//! enabled: true
//! include_root: ./templates
//! cache_includes: true
//! stylesheet_extensions: [css]
//! builtin_providers: true
//! variables:
//!   core:
//!     port: 8080
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::value::{Map, Value};

/// Settings for a [`CrushEngine`](crate::CrushEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrushConfig {
    /// When false, `render` returns documents unchanged.
    pub enabled: bool,

    /// Directory `{{include:path}}` directives are resolved against.
    pub include_root: PathBuf,

    /// Memoize resolved include bodies across render passes.
    pub cache_includes: bool,

    /// File extensions (without dot, case-insensitive) wrapped in `<style>`.
    pub stylesheet_extensions: Vec<String>,

    /// Register the `request`, `get`, `post`, `meta` and `cfg` namespaces.
    pub builtin_providers: bool,

    /// Sections exposed through the `cfg` namespace as `{{cfg.section@key}}`.
    pub variables: Map<String, Value>,
}

impl Default for CrushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_root: PathBuf::from("."),
            cache_includes: true,
            stylesheet_extensions: vec!["css".to_string()],
            builtin_providers: true,
            variables: Map::new(),
        }
    }
}

impl CrushConfig {
    /// Parses a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML configuration file.
    ///
    /// A relative `include_root` is resolved against the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&text)?;
        if config.include_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.include_root = dir.join(&config.include_root);
            }
        }
        tracing::debug!(path = %path.display(), ?config, "loaded crush config");
        Ok(config)
    }

    pub fn with_include_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.include_root = root.into();
        self
    }

    pub fn with_cache_includes(mut self, enabled: bool) -> Self {
        self.cache_includes = enabled;
        self
    }

    /// Returns true if the path's extension marks it as a stylesheet.
    pub fn is_stylesheet(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.stylesheet_extensions
                    .iter()
                    .any(|s| s.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
