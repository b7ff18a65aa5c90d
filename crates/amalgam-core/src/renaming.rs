//! Per-file identifier renamings discovered from compiler diagnostics.

use crate::naming::{self, namespaced_alias};
use std::collections::{BTreeMap, BTreeSet};

/// Maps a unit's relative path to the identifiers that must be aliased
/// into that unit's namespace.
///
/// Ordered maps keep synthesis output stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamingTable {
    entries: BTreeMap<String, BTreeSet<String>>,
}

/// One `#define identifier alias` line for a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renaming<'a> {
    pub identifier: &'a str,
    pub alias: String,
}

impl RenamingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `identifier` collides inside the unit at `relative_path`.
    ///
    /// Returns `false` if it was already recorded, or if `identifier` is not
    /// something a macro can rename.
    pub fn insert(&mut self, relative_path: impl Into<String>, identifier: impl Into<String>) -> bool {
        let identifier = identifier.into();
        if !naming::is_c_identifier(&identifier) {
            return false;
        }
        self.entries
            .entry(relative_path.into())
            .or_default()
            .insert(identifier)
    }

    pub fn identifiers_for(&self, relative_path: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(relative_path)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// The aliases a unit needs, sorted by identifier.
    pub fn renamings_for<'a>(
        &'a self,
        relative_path: &str,
        path_identifier: &str,
    ) -> Vec<Renaming<'a>> {
        self.identifiers_for(relative_path)
            .map(|identifier| Renaming {
                identifier,
                alias: namespaced_alias(path_identifier, identifier),
            })
            .collect()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files with at least one renaming.
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn identifier_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}
