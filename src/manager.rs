// src/manager.rs

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::{SettingsStore, WatchSettings, clamp_interval};
use crate::errors::{Result, WatchError};
use crate::host::HostBridge;
use crate::registry::{WatchEntry, WatchRegistry};
use crate::watch::{ChangeCallback, WatcherEngine, WatcherId};

/// Events consumed by the manager's run loop.
#[derive(Debug, Clone)]
pub enum ManagerEvent {
    /// A live watcher observed a change on its file.
    FileChanged { id: WatcherId, path: String },
    /// Tear down and restart every active watcher (e.g. on SIGHUP).
    RestartRequested,
    /// Stop the run loop.
    ShutdownRequested,
}

/// One row of `list` output: registry state plus whether a poller is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchStatus {
    pub path: String,
    pub active: bool,
    pub live: bool,
}

/// Coordinates the registry, the watcher engine, the settings store, and the
/// host. All mutations flow through here: registry and live watchers stay
/// consistent, the settings blob is persisted after every change, and
/// failures surface as host notifications instead of escaping.
///
/// Change events never act directly from the poll threads. Each watcher's
/// callback posts a [`ManagerEvent`] into one channel and the manager's
/// single event loop does the dispatch, so handlers never overlap. Stale
/// events from a watcher stopped after the event was queued are filtered by
/// watcher id before any reload happens.
pub struct WatchManager {
    registry: WatchRegistry,
    engine: WatcherEngine,
    interval_ms: u64,
    host: Arc<dyn HostBridge>,
    store: Box<dyn SettingsStore>,
    events_tx: UnboundedSender<ManagerEvent>,
    events_rx: UnboundedReceiver<ManagerEvent>,
}

impl WatchManager {
    /// Loads settings through the store and builds an idle manager. No
    /// watchers are started yet; call [`restart_all`](Self::restart_all) to
    /// bring active entries live.
    ///
    /// A store that fails to load is reported to the host and treated as
    /// empty defaults, so a corrupt settings file never blocks startup.
    pub fn new(host: Arc<dyn HostBridge>, store: Box<dyn SettingsStore>) -> Self {
        let settings = match store.load() {
            Ok(settings) => settings,
            Err(err) => {
                host.notify(&format!(
                    "filepulse: could not load settings, starting from defaults: {err}"
                ));
                WatchSettings::default()
            }
        };
        let registry = WatchRegistry::from_entries(settings.file_watchers);
        let interval_ms = clamp_interval(settings.file_watcher_interval);
        debug!(
            entries = registry.len(),
            interval_ms, "watch settings loaded"
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = WatcherEngine::new(host.base_path());
        Self {
            registry,
            engine,
            interval_ms,
            host,
            store,
            events_tx,
            events_rx,
        }
    }

    /// Registers a new entry and starts watching it immediately.
    ///
    /// If the watcher cannot start (missing file, not a regular file), the
    /// registry entry is rolled back and nothing is persisted, leaving state
    /// exactly as before the call.
    pub fn add(&mut self, path: &str) -> Result<()> {
        if let Err(err) = self.registry.add(path) {
            self.host
                .notify(&format!("filepulse: cannot add '{path}': {err}"));
            return Err(err);
        }
        let entry = WatchEntry::new(path);
        if let Err(err) = self.start_watcher(&entry) {
            self.registry.remove(path);
            self.host
                .notify(&format!("filepulse: cannot watch '{path}': {err}"));
            return Err(err);
        }
        info!(file = %path, "watch entry added");
        self.persist()
    }

    /// Stops the watcher (if live) and removes the entry. Removing an
    /// unregistered path is a no-op.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        self.engine.stop(path);
        if self.registry.remove(path) {
            info!(file = %path, "watch entry removed");
            self.persist()?;
        }
        Ok(())
    }

    /// Marks the entry active and starts its watcher.
    ///
    /// The flag is set and persisted even when the start fails, so the entry
    /// is picked up by a later restart once the file exists again. The start
    /// failure is still reported and returned.
    pub fn activate(&mut self, path: &str) -> Result<()> {
        let Some(entry) = self.registry.get(path) else {
            self.host
                .notify(&format!("filepulse: no watch entry for '{path}'"));
            return Ok(());
        };
        let mut entry = entry.clone();
        entry.active = true;
        self.registry.set_active(path, true);

        let started = self.start_watcher(&entry);
        let persisted = self.persist();
        match started {
            Ok(_) => {
                info!(file = %path, "watch entry enabled");
                persisted
            }
            Err(err) => {
                self.host
                    .notify(&format!("filepulse: cannot watch '{path}': {err}"));
                Err(err)
            }
        }
    }

    /// Stops the watcher and clears the active flag. The entry stays
    /// registered. Unknown paths are a no-op.
    pub fn deactivate(&mut self, path: &str) -> Result<()> {
        self.engine.stop(path);
        if self.registry.set_active(path, false) {
            info!(file = %path, "watch entry disabled");
            self.persist()?;
        }
        Ok(())
    }

    /// Stores a new poll interval, clamped into the supported range. Live
    /// watchers keep polling at their old interval until the next (re)start.
    pub fn set_interval(&mut self, ms: u64) -> Result<()> {
        let clamped = clamp_interval(ms);
        if clamped != ms {
            debug!(requested = ms, clamped, "poll interval clamped");
        }
        self.interval_ms = clamped;
        info!(interval_ms = clamped, "poll interval updated");
        self.persist()
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Stops every live watcher and starts fresh ones for all active
    /// entries. Per-entry failures are notified and returned; the remaining
    /// entries still come up.
    pub fn restart_all(&mut self) -> Vec<(String, WatchError)> {
        let entries = self.registry.entries().to_vec();
        let tx = self.events_tx.clone();
        let failures = self
            .engine
            .restart_all(&entries, self.interval_ms, |path| change_callback(&tx, path));
        info!(
            live = self.engine.live_count(),
            failed = failures.len(),
            "watchers restarted"
        );
        for (path, err) in &failures {
            self.host
                .notify(&format!("filepulse: cannot watch '{path}': {err}"));
        }
        failures
    }

    /// Registry entries in order, each with its live status.
    pub fn list(&self) -> Vec<WatchStatus> {
        self.registry
            .entries()
            .iter()
            .map(|entry| WatchStatus {
                path: entry.path.clone(),
                active: entry.active,
                live: self.engine.is_live(&entry.path),
            })
            .collect()
    }

    /// Whether `path` is registered (active or not).
    pub fn contains(&self, path: &str) -> bool {
        self.registry.contains(path)
    }

    pub fn is_live(&self, path: &str) -> bool {
        self.engine.is_live(path)
    }

    pub fn live_count(&self) -> usize {
        self.engine.live_count()
    }

    /// Snapshot in the persisted blob shape.
    pub fn settings(&self) -> WatchSettings {
        WatchSettings {
            file_watchers: self.registry.entries().to_vec(),
            file_watcher_interval: self.interval_ms,
        }
    }

    /// Sender for injecting events from outside the manager (signal handlers,
    /// host shutdown paths, tests).
    pub fn event_sender(&self) -> UnboundedSender<ManagerEvent> {
        self.events_tx.clone()
    }

    /// Next queued event. Exposed so tests and embedding hosts can drive the
    /// loop one step at a time instead of calling [`run`](Self::run).
    pub async fn next_event(&mut self) -> Option<ManagerEvent> {
        self.events_rx.recv().await
    }

    /// Handles a single event. Returns `false` when the loop should stop.
    ///
    /// Must run inside a tokio runtime: reloads are spawned as tasks.
    pub fn handle_event(&mut self, event: ManagerEvent) -> bool {
        match event {
            ManagerEvent::FileChanged { id, path } => {
                self.dispatch_change(id, &path);
                true
            }
            ManagerEvent::RestartRequested => {
                info!("restart requested");
                self.restart_all();
                true
            }
            ManagerEvent::ShutdownRequested => {
                info!("shutdown requested");
                false
            }
        }
    }

    /// Reloads every currently watched file once. Used at startup so the
    /// host's cache is warm before the first change arrives.
    pub fn preload(&self) {
        for watcher in self.engine.live_watchers() {
            self.spawn_reload(
                watcher.entry_path().to_string(),
                watcher.resolved_path().to_path_buf(),
            );
        }
    }

    /// Consumes events until shutdown is requested or the channel closes.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            entries = self.registry.len(),
            live = self.engine.live_count(),
            interval_ms = self.interval_ms,
            "watch manager started"
        );
        loop {
            let Some(event) = self.events_rx.recv().await else {
                info!("event channel closed; shutting down");
                break;
            };
            debug!(?event, "manager received event");
            if !self.handle_event(event) {
                break;
            }
        }
        self.engine.stop_all();
        info!("watch manager exiting");
        Ok(())
    }

    fn start_watcher(&mut self, entry: &WatchEntry) -> Result<WatcherId> {
        let callback = change_callback(&self.events_tx, &entry.path);
        self.engine.start(entry, self.interval_ms, callback)
    }

    fn dispatch_change(&self, id: WatcherId, path: &str) {
        let Some(watcher) = self.engine.watcher(path) else {
            debug!(file = %path, "dropping change event from stopped watcher");
            return;
        };
        if watcher.id() != id {
            debug!(
                file = %path,
                stale_id = id,
                current_id = watcher.id(),
                "dropping stale change event"
            );
            return;
        }
        info!(file = %path, "file changed");
        self.spawn_reload(path.to_string(), watcher.resolved_path().to_path_buf());
    }

    /// Reads the file off the event loop and hands the contents to the host.
    /// Read failures become notifications; the watcher stays live either way.
    fn spawn_reload(&self, key: String, resolved: PathBuf) {
        let host = Arc::clone(&self.host);
        tokio::spawn(async move {
            match host.read_file(resolved).await {
                Ok(content) => {
                    debug!(file = %key, bytes = content.len(), "file read, refreshing resource");
                    host.reload_resource(&key, content);
                }
                Err(err) => {
                    host.notify(&format!("filepulse: failed to reload '{key}': {err}"));
                }
            }
        });
    }

    fn persist(&mut self) -> Result<()> {
        let settings = self.settings();
        if let Err(err) = self.store.save(&settings) {
            self.host
                .notify(&format!("filepulse: failed to save settings: {err}"));
            return Err(err);
        }
        Ok(())
    }
}

/// Builds the callback a watcher invokes from its poll thread: it forwards
/// the change into the manager's event channel, tagged with the watcher id.
fn change_callback(tx: &UnboundedSender<ManagerEvent>, path: &str) -> ChangeCallback {
    let tx = tx.clone();
    let path = path.to_string();
    Box::new(move |id| {
        if tx
            .send(ManagerEvent::FileChanged {
                id,
                path: path.clone(),
            })
            .is_err()
        {
            // Manager already gone; nothing useful left to do on this thread.
            eprintln!("filepulse: dropping change event for '{path}'");
        }
    })
}
