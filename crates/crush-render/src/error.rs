//! Error types for the Crush engine.
//!
//! Rendering itself never fails: every directive degrades to a local fallback
//! (empty text or the directive left as-is). These types describe the failures
//! that are caught inside the pipeline, plus the ones that surface while
//! building an engine (configuration loading).

use std::path::PathBuf;

use thiserror::Error;

/// A variable provider failed to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider does not expose the requested field.
    #[error("provider has no field '{0}'")]
    MissingField(String),

    /// The provider failed while looking up a field.
    #[error("lookup of '{field}' failed: {reason}")]
    Lookup { field: String, reason: String },
}

impl ProviderError {
    /// Create a lookup failure.
    pub fn lookup(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Lookup {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A filter could not be applied to an interpolated value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// No filter is registered under the requested name.
    #[error("unknown filter '{0}'")]
    Unknown(String),

    /// The filter rejected its input.
    #[error("filter '{filter}' failed: {reason}")]
    Failed { filter: String, reason: String },
}

impl FilterError {
    /// Create a filter failure.
    pub fn failed(filter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            filter: filter.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid YAML for [`CrushConfig`](crate::CrushConfig).
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Crate-wide error type.
///
/// Only engine setup and template loading can fail; directive failures stay
/// inside the render pass.
#[derive(Debug, Error)]
pub enum CrushError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A template file could not be read.
    #[error("failed to read template '{}': {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for Crush operations.
pub type Result<T> = std::result::Result<T, CrushError>;
