//! Template-local macros.
//!
//! ```text
//! {#macro card title body}<div><h2>{{title}}</h2>{{body}}</div>{/macro}
//! #card("Welcome" "Hello there")#
//! ```
//!
//! Definitions are collected and removed first, then usages are expanded.
//! Definitions only live for the current render pass.

use std::collections::HashMap;

use regex::{Captures, Regex};

use super::{Scope, Syntax};

pattern!(
    DEFINITION,
    r"\{#macro (?P<name>[A-Za-z0-9_]+)(?P<params>[A-Za-z0-9_\s]*)\}(?P<body>[\s\S]*?)\{/macro\}"
);
pattern!(
    USAGE,
    r#"#(?P<name>[A-Za-z0-9_]+)\s*\((?P<args>\s*(?:"[^"]*"\s*)*)\)#"#
);
pattern!(ARGUMENT, r#""(?P<arg>[^"]*)""#);
pattern!(PLACEHOLDER, r"\{\{(?P<name>[A-Za-z0-9_]+)\}\}");

/// A macro collected from the current document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DefinedMacro {
    parameters: Vec<String>,
    body: String,
}

impl DefinedMacro {
    /// Binds arguments to parameters by position.
    ///
    /// Always yields one value per parameter: missing trailing arguments bind
    /// to empty text, surplus arguments are dropped.
    fn bind<'a>(&'a self, args: &[&'a str]) -> HashMap<&'a str, &'a str> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(i, param)| (param.as_str(), args.get(i).copied().unwrap_or("")))
            .collect()
    }

    /// Expands the body for one usage.
    ///
    /// Substitution is a single pass, so argument text is never re-scanned
    /// for placeholders.
    fn expand(&self, args: &[&str]) -> String {
        let bindings = self.bind(args);
        PLACEHOLDER
            .replace_all(&self.body, |caps: &Captures| {
                match bindings.get(&caps["name"]) {
                    Some(value) => (*value).to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

/// Collects `{#macro}` definitions and expands `#name(...)#` usages.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacroSyntax;

impl MacroSyntax {
    fn collect(input: &str) -> (String, HashMap<String, DefinedMacro>) {
        let mut macros = HashMap::new();
        let stripped = DEFINITION
            .replace_all(input, |caps: &Captures| {
                let parameters = caps["params"].split_whitespace().map(String::from).collect();
                macros.insert(
                    caps["name"].to_string(),
                    DefinedMacro {
                        parameters,
                        body: caps["body"].to_string(),
                    },
                );
                String::new()
            })
            .into_owned();
        (stripped, macros)
    }
}

impl Syntax for MacroSyntax {
    fn name(&self) -> &'static str {
        "macro"
    }

    fn pattern(&self) -> &Regex {
        &DEFINITION
    }

    fn matches(&self, input: &str) -> bool {
        DEFINITION.is_match(input) || USAGE.is_match(input)
    }

    fn process(&self, input: &str, _scope: &mut Scope<'_>) -> String {
        let (document, macros) = Self::collect(input);

        USAGE
            .replace_all(&document, |caps: &Captures| {
                let name = &caps["name"];
                let Some(definition) = macros.get(name) else {
                    tracing::warn!(macro_name = name, "crush template requesting invalid macro");
                    return caps[0].to_string();
                };
                let args: Vec<&str> = ARGUMENT
                    .captures_iter(&caps["args"])
                    .filter_map(|arg| arg.name("arg").map(|m| m.as_str()))
                    .collect();
                definition.expand(&args)
            })
            .into_owned()
    }
}
