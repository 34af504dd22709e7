//! # Crush - Command-Line Template Renderer
//!
//! Renders one Crush template file to stdout:
//!
//! ```bash
//! crush --data user=user.json --param page=2 --path /profile templates/profile.html
//! ```
//!
//! - `--data NS=PATH` exposes a JSON or YAML object file as namespace `NS`
//! - `--param KEY=VALUE` adds a query parameter, visible as `{{get.KEY}}`
//! - `--path PATH` sets the request path, visible as `{{request.path}}`
//! - `--config FILE` loads a YAML [`CrushConfig`]
//! - `--include-root DIR` resolves includes against `DIR` instead of the
//!   template's directory
//! - `--no-cache` disables the include cache
//! - `--meta` prints the document metadata to stderr
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::Style;
use crush_render::value::Map;
use crush_render::{CrushConfig, CrushEngine, ProviderRegistry, RequestContext, Value};

/// Render a Crush template
#[derive(Debug, Parser)]
#[command(name = "crush")]
#[command(version)]
#[command(about = "Render a Crush template to stdout")]
pub struct Cli {
    /// Template file to render
    pub template: PathBuf,

    /// Expose a JSON or YAML object file as a namespace
    #[arg(long = "data", value_name = "NS=PATH", value_parser = parse_data)]
    pub data: Vec<(String, PathBuf)>,

    /// Add a query parameter to the request
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Request path exposed as `request.path`
    #[arg(long, default_value = "/")]
    pub path: String,

    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory includes are resolved against [default: the template's directory]
    #[arg(long, value_name = "DIR")]
    pub include_root: Option<PathBuf>,

    /// Disable the include cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print the document metadata to stderr
    #[arg(long)]
    pub meta: bool,
}

/// Result of rendering a template.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub output: String,
    pub meta: Map<String, Value>,
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("missing key in '{}'", s));
    }
    Ok((key, value))
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = split_pair(s)?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_data(s: &str) -> Result<(String, PathBuf), String> {
    let (namespace, path) = split_pair(s)?;
    if path.is_empty() {
        return Err(format!("missing path in '{}'", s));
    }
    Ok((namespace.to_string(), PathBuf::from(path)))
}

/// Loads a JSON or YAML object file, chosen by extension.
pub fn load_data(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read data file '{}'", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let value: Value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in '{}'", path.display()))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("invalid YAML in '{}'", path.display()))?,
        _ => bail!(
            "unsupported data file '{}': expected .json, .yaml or .yml",
            path.display()
        ),
    };
    match value {
        Value::Object(values) => Ok(values),
        _ => bail!("data file '{}' must contain an object", path.display()),
    }
}

fn template_dir(template: &Path) -> PathBuf {
    match template.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Builds the engine configuration from the command line.
///
/// `--include-root` and `--no-cache` override whatever the config file says.
pub fn resolve_config(cli: &Cli) -> Result<CrushConfig> {
    let mut config = match &cli.config {
        Some(path) => CrushConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => CrushConfig::default().with_include_root(template_dir(&cli.template)),
    };
    if let Some(root) = &cli.include_root {
        config = config.with_include_root(root);
    }
    if cli.no_cache {
        config = config.with_cache_includes(false);
    }
    Ok(config)
}

/// Renders the template named on the command line.
pub fn run(cli: &Cli) -> Result<Rendered> {
    let config = resolve_config(cli)?;

    let mut providers = ProviderRegistry::new();
    for (namespace, path) in &cli.data {
        providers.add_static(namespace, load_data(path)?);
    }

    let mut ctx = cli
        .params
        .iter()
        .fold(RequestContext::new(cli.path.clone()), |ctx, (key, value)| {
            ctx.with_query(key.clone(), value.clone())
        });

    tracing::debug!(
        template = %cli.template.display(),
        namespaces = cli.data.len(),
        "rendering template"
    );
    let engine = CrushEngine::builder().config(config).providers(providers).build();
    let output = engine.render_file(&cli.template, &mut ctx)?;

    Ok(Rendered {
        output,
        meta: ctx.meta().clone(),
    })
}

/// Formats metadata as `key: value` lines.
pub fn meta_report(meta: &Map<String, Value>, colored: bool) -> String {
    let key_style = Style::new().cyan().bold().force_styling(colored);
    meta.iter()
        .map(|(key, value)| {
            format!(
                "{}: {}\n",
                key_style.apply_to(key),
                crush_render::to_text(value)
            )
        })
        .collect()
}
