//! Include cache shared between render passes.
//!
//! Resolved `{{include:path}}` bodies are keyed by the exact directive text.
//! Entries live until [`IncludeCache::clear`] is called; there is no eviction.

use dashmap::DashMap;

/// Storage for resolved include bodies.
///
/// Implementations must tolerate concurrent reads and writes from many
/// request threads.
pub trait IncludeCache: Send + Sync {
    /// Gets the body cached for a directive, if any.
    fn get(&self, directive: &str) -> Option<String>;

    /// Stores the body resolved for a directive.
    fn put(&self, directive: &str, body: String);

    /// Drops every entry.
    fn clear(&self);
}

/// In-memory [`IncludeCache`] backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryIncludeCache {
    entries: DashMap<String, String>,
}

impl MemoryIncludeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IncludeCache for MemoryIncludeCache {
    fn get(&self, directive: &str) -> Option<String> {
        self.entries.get(directive).map(|entry| entry.value().clone())
    }

    fn put(&self, directive: &str, body: String) {
        self.entries.insert(directive.to_string(), body);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
