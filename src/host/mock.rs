// src/host/mock.rs

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::errors::{Result, WatchError};
use crate::host::HostBridge;

/// Host bridge for tests. Reads go to the real filesystem (tests pair this
/// with `tempfile`), while reloads and notifications are recorded for
/// inspection instead of touching any real application state. Cloning shares
/// the recorded state, so tests keep a clone and hand the original to the
/// manager.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    base_dir: PathBuf,
    reloads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    notifications: Arc<Mutex<Vec<String>>>,
    failing_reads: Arc<Mutex<HashSet<PathBuf>>>,
}

impl RecordingHost {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            reloads: Arc::new(Mutex::new(Vec::new())),
            notifications: Arc::new(Mutex::new(Vec::new())),
            failing_reads: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Makes every future read of `path` fail with a synthetic IO error.
    pub fn fail_reads_on(&self, path: impl Into<PathBuf>) {
        if let Ok(mut failing) = self.failing_reads.lock() {
            failing.insert(path.into());
        }
    }

    /// All `(key, content)` pairs passed to `reload_resource`, in order.
    pub fn reloads(&self) -> Vec<(String, Vec<u8>)> {
        self.reloads.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn reload_count(&self) -> usize {
        self.reloads.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn last_reload(&self) -> Option<(String, Vec<u8>)> {
        self.reloads
            .lock()
            .ok()
            .and_then(|r| r.last().cloned())
    }

    /// All messages passed to `notify`, in order.
    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().map(|n| n.len()).unwrap_or(0)
    }
}

impl HostBridge for RecordingHost {
    fn base_path(&self) -> PathBuf {
        self.base_dir.clone()
    }

    fn read_file(
        &self,
        path: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        let fail = self
            .failing_reads
            .lock()
            .map(|failing| failing.contains(&path))
            .unwrap_or(false);
        Box::pin(async move {
            if fail {
                return Err(WatchError::ReadFailure {
                    path,
                    source: io::Error::other("injected read failure"),
                });
            }
            tokio::fs::read(&path).await.map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => WatchError::NotFound(path),
                _ => WatchError::ReadFailure { path, source: err },
            })
        })
    }

    fn reload_resource(&self, key: &str, content: Vec<u8>) {
        if let Ok(mut reloads) = self.reloads.lock() {
            reloads.push((key.to_string(), content));
        }
    }

    fn notify(&self, message: &str) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(message.to_string());
        }
    }
}
