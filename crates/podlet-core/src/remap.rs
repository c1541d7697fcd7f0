//! Name remapping tables.
//!
//! A remap table redirects an instance's external references: every lookup of
//! a source name resolves to its target name. The registry passes the table
//! to an instance opaquely at init time and never interprets it.

use std::collections::HashMap;

use tracing::warn;

/// Opaque source-name to target-name mapping handed to an instance at init.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    entries: HashMap<String, String>,
}

impl RemapTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip equal-length source and target lists into a table.
    ///
    /// A length mismatch is a caller error, not a fatal one: it is logged and
    /// an empty table is returned so the load can proceed without
    /// remappings.
    pub fn from_pairs(sources: &[String], targets: &[String]) -> Self {
        if sources.len() != targets.len() {
            warn!(
                sources = sources.len(),
                targets = targets.len(),
                "remap source and target lists differ in length, ignoring remappings"
            );
            return Self::default();
        }

        Self {
            entries: sources
                .iter()
                .cloned()
                .zip(targets.iter().cloned())
                .collect(),
        }
    }

    /// Add a single remapping.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.entries.insert(source.into(), target.into());
    }

    /// Resolve a source name, if it is remapped.
    pub fn resolve(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Resolve a source name, falling back to the name itself.
    pub fn resolve_or_self<'a>(&'a self, source: &'a str) -> &'a str {
        self.resolve(source).unwrap_or(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(s, t)| (s.as_str(), t.as_str()))
    }
}
