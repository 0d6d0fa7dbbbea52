// src/host/mod.rs

//! Capabilities the embedding application provides to the watch manager.
//!
//! The manager never touches resource state or user notification channels
//! directly; everything goes through [`HostBridge`]. `CacheHost` is the
//! standalone implementation used by the CLI, `mock::RecordingHost` the test
//! double.

pub mod mock;

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::errors::{Result, WatchError};

/// Application-side capabilities for the watch manager.
pub trait HostBridge: Send + Sync {
    /// Directory all entry paths resolve against.
    fn base_path(&self) -> PathBuf;

    /// Reads the full contents of a resolved file.
    fn read_file(
        &self,
        path: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>>;

    /// Replaces the host's copy of a resource with freshly read contents and
    /// triggers whatever downstream refresh the host performs.
    fn reload_resource(&self, key: &str, content: Vec<u8>);

    /// Best-effort, non-blocking user-visible notification.
    fn notify(&self, message: &str);
}

/// Host for the standalone CLI: keeps reloaded files in an in-memory cache
/// and prints reload and notification lines to the terminal.
#[derive(Debug)]
pub struct CacheHost {
    base_dir: PathBuf,
    resources: Mutex<HashMap<String, Vec<u8>>>,
}

impl CacheHost {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            resources: Mutex::new(HashMap::new()),
        }
    }

    /// Cached contents for a resource key, if it was ever reloaded.
    pub fn resource(&self, key: &str) -> Option<Vec<u8>> {
        self.resources
            .lock()
            .ok()
            .and_then(|cache| cache.get(key).cloned())
    }

    pub fn resource_count(&self) -> usize {
        self.resources.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl HostBridge for CacheHost {
    fn base_path(&self) -> PathBuf {
        self.base_dir.clone()
    }

    fn read_file(
        &self,
        path: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        Box::pin(async move {
            tokio::fs::read(&path).await.map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => WatchError::NotFound(path),
                _ => WatchError::ReadFailure { path, source: err },
            })
        })
    }

    fn reload_resource(&self, key: &str, content: Vec<u8>) {
        let mut cache = match self.resources.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!("resource cache mutex poisoned; dropping reload");
                return;
            }
        };
        let bytes = content.len();
        let replaced = cache.insert(key.to_string(), content).is_some();
        drop(cache);
        debug!(resource = %key, bytes, replaced, "resource cache refreshed");
        println!("[filepulse] reloaded '{key}' ({bytes} bytes)");
    }

    fn notify(&self, message: &str) {
        println!("[filepulse] {message}");
        info!("{message}");
    }
}
