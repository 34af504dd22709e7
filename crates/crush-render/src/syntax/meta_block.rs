//! `{{: [key: value] ... :}}` document metadata blocks.

use regex::{Captures, Regex};

use super::{Scope, Syntax};

pattern!(BLOCK, r"\{\{:(?P<body>[\s\S]*?):\}\}");
pattern!(ENTRY, r"\[(?P<key>[A-Za-z0-9_\-]+):[ ]?(?P<value>[^\]]*)\]");

/// Pushes every `[key: value]` entry of a block into the context's metadata,
/// then removes the block.
///
/// Entries that don't match the grammar are skipped without a diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaBlock;

impl Syntax for MetaBlock {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn pattern(&self) -> &Regex {
        &BLOCK
    }

    fn process(&self, input: &str, scope: &mut Scope<'_>) -> String {
        BLOCK
            .replace_all(input, |caps: &Captures| {
                for entry in ENTRY.captures_iter(&caps["body"]) {
                    scope.context.add_meta(&entry["key"], &entry["value"]);
                }
                String::new()
            })
            .into_owned()
    }
}
