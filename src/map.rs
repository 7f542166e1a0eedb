//! The `map` section: which variables each file section populates.

use std::{collections::BTreeMap, mem};

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Pending(Vec<String>),
    Consumed,
}

/// Maps file section names to the variable paths they must be bound to.
///
/// Each key must be satisfied by exactly one file section. [`take`](Self::take) hands out a key's
/// paths once and marks it consumed; keys never taken are reported by
/// [`first_pending`](Self::first_pending). Keys are kept sorted, so the order in which pending
/// keys are reported is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>")]
pub struct PathMap {
    entries: BTreeMap<String, Entry>,
}

impl PathMap {
    /// Decodes the JSON body of a `map` section.
    pub fn from_slice(data: &[u8]) -> Result<PathMap, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Consumes `key`, returning its paths.
    ///
    /// Returns `None` when the key is unknown, has already been consumed, or declares no paths.
    pub fn take(&mut self, key: &str) -> Option<Vec<String>> {
        let entry = self.entries.get_mut(key)?;

        if !matches!(entry, Entry::Pending(paths) if !paths.is_empty()) {
            return None;
        }

        match mem::replace(entry, Entry::Consumed) {
            Entry::Pending(paths) => Some(paths),
            Entry::Consumed => None,
        }
    }

    /// Returns true if `key` is still waiting for a file section.
    pub fn is_pending(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Entry::Pending(_)))
    }

    /// Iterates over keys not yet satisfied by a file section, in sorted order.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|(key, entry)| match entry {
            Entry::Pending(_) => Some(key.as_str()),
            Entry::Consumed => None,
        })
    }

    /// Returns the first key not yet satisfied by a file section.
    pub fn first_pending(&self) -> Option<&str> {
        self.pending().next()
    }

    /// Returns the number of keys declared.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, Vec<String>>> for PathMap {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        PathMap {
            entries: map
                .into_iter()
                .map(|(key, paths)| (key, Entry::Pending(paths)))
                .collect(),
        }
    }
}
