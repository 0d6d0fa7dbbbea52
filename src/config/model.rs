// src/config/model.rs

use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::WatchEntry;

/// Poll interval used when the blob has none, in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 200;
/// Lower bound for the poll interval, in milliseconds.
pub const MIN_INTERVAL_MS: u64 = 100;
/// Upper bound for the poll interval, in milliseconds.
pub const MAX_INTERVAL_MS: u64 = 10_000;

/// Clamps a requested poll interval into the supported range.
pub fn clamp_interval(ms: u64) -> u64 {
    ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS)
}

/// Persisted settings blob as stored on disk:
///
/// ```json
/// {
///   "fileWatchers": [ { "file": "themes/base.css", "active": true } ],
///   "fileWatcherInterval": 200
/// }
/// ```
///
/// Loading is lenient: missing keys fall back to defaults, unknown keys are
/// ignored, and a malformed interval degrades to the default instead of
/// failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSettings {
    #[serde(default)]
    pub file_watchers: Vec<WatchEntry>,
    #[serde(default = "default_interval", deserialize_with = "lenient_interval")]
    pub file_watcher_interval: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            file_watchers: Vec::new(),
            file_watcher_interval: DEFAULT_INTERVAL_MS,
        }
    }
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

/// Accepts whatever sits where the interval should be. Integers are clamped
/// into range, non-negative floats are truncated then clamped, and anything
/// else (strings, null, objects) degrades to the default.
fn lenient_interval<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let interval = if let Some(ms) = value.as_u64() {
        clamp_interval(ms)
    } else if let Some(ms) = value.as_f64().filter(|ms| *ms >= 0.0) {
        clamp_interval(ms as u64)
    } else {
        DEFAULT_INTERVAL_MS
    };
    Ok(interval)
}
