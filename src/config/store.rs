// src/config/store.rs

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::model::WatchSettings;
use crate::errors::{Result, WatchError};

/// Where the settings blob lives. The manager runs against a JSON file in
/// production and an in-memory store in tests.
pub trait SettingsStore: Send + Sync {
    /// Loads the persisted settings, or defaults when nothing was saved yet.
    /// A missing file is not an error; it simply means default settings.
    fn load(&self) -> Result<WatchSettings>;

    /// Persists the full settings snapshot, replacing whatever was there.
    fn save(&mut self, settings: &WatchSettings) -> Result<()>;
}

/// Settings stored as a pretty-printed JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<WatchSettings> {
        if !self.path.exists() {
            debug!(path = ?self.path, "no settings file yet, using defaults");
            return Ok(WatchSettings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let settings = serde_json::from_str(&content).map_err(|err| {
            WatchError::Settings(format!("malformed settings file {:?}: {err}", self.path))
        })?;
        Ok(settings)
    }

    fn save(&mut self, settings: &WatchSettings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        debug!(path = ?self.path, entries = settings.file_watchers.len(), "settings saved");
        Ok(())
    }
}

/// In-memory store for tests. Cloning shares the underlying snapshot, so a
/// test can hand one clone to a manager and inspect the other afterwards.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsStore {
    inner: Arc<Mutex<WatchSettings>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: WatchSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(settings)),
        }
    }

    /// Current snapshot, as the next `load` would see it.
    pub fn snapshot(&self) -> WatchSettings {
        self.inner.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn load(&self) -> Result<WatchSettings> {
        self.inner
            .lock()
            .map(|settings| settings.clone())
            .map_err(|_| WatchError::Settings("settings store mutex poisoned".to_string()))
    }

    fn save(&mut self, settings: &WatchSettings) -> Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| WatchError::Settings("settings store mutex poisoned".to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}
