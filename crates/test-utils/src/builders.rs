#![allow(dead_code)]

use filepulse::config::WatchSettings;
use filepulse::registry::WatchEntry;

/// Builder for `WatchSettings` to simplify test setup.
pub struct WatchSettingsBuilder {
    settings: WatchSettings,
}

impl WatchSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: WatchSettings::default(),
        }
    }

    pub fn with_entry(mut self, path: &str) -> Self {
        self.settings.file_watchers.push(WatchEntry::new(path));
        self
    }

    pub fn with_inactive_entry(mut self, path: &str) -> Self {
        self.settings.file_watchers.push(WatchEntry {
            path: path.into(),
            active: false,
        });
        self
    }

    /// Sets the poll interval without clamping, so tests can exercise the
    /// loading-side normalization.
    pub fn with_interval(mut self, ms: u64) -> Self {
        self.settings.file_watcher_interval = ms;
        self
    }

    pub fn build(self) -> WatchSettings {
        self.settings
    }
}

impl Default for WatchSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
