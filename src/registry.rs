// src/registry.rs

use serde::{Deserialize, Serialize};

use crate::errors::{Result, WatchError};

/// One watched file: a path relative to the host's base directory plus an
/// enabled flag. Serialized into the settings blob as `{file, active}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    #[serde(rename = "file")]
    pub path: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl WatchEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            active: true,
        }
    }
}

/// Ordered, deduplicated list of watch entries. Paths are compared
/// byte-for-byte with no normalization, so `./a.css` and `a.css` are
/// distinct keys. Insertion order survives save/load round trips.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    entries: Vec<WatchEntry>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from already-persisted entries, dropping duplicate
    /// paths (first occurrence wins). Hand-edited settings files are the only
    /// way duplicates can appear.
    pub fn from_entries(entries: Vec<WatchEntry>) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            if !registry.contains(&entry.path) {
                registry.entries.push(entry);
            }
        }
        registry
    }

    /// Appends a new entry with `active = true`.
    ///
    /// Rejects empty paths with [`WatchError::InvalidPath`] and duplicate
    /// paths with [`WatchError::AlreadyExists`]. The registry itself never
    /// touches the filesystem; existence checks belong to the watch engine.
    pub fn add(&mut self, path: &str) -> Result<()> {
        if path.trim().is_empty() {
            return Err(WatchError::InvalidPath(path.to_string()));
        }
        if self.contains(path) {
            return Err(WatchError::AlreadyExists(path.to_string()));
        }
        self.entries.push(WatchEntry::new(path));
        Ok(())
    }

    /// Removes the entry with the given path. Returns `false` if no entry
    /// matched; removing an absent path is not an error.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        self.entries.len() != before
    }

    /// Flips the active flag on an existing entry. Returns `false` (a no-op)
    /// if the path is not registered.
    pub fn set_active(&mut self, path: &str, active: bool) -> bool {
        match self.entries.iter_mut().find(|entry| entry.path == path) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, path: &str) -> Option<&WatchEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[WatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
