// src/watch/engine.rs

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tracing::debug;

use crate::errors::{Result, WatchError};
use crate::registry::WatchEntry;
use crate::watch::resolve::resolve_watch_path;

/// Generation id for one started watcher. Restarting an entry assigns a new
/// id, so stale events are distinguishable from live ones.
pub type WatcherId = u64;

/// Invoked from the poll thread whenever the watched file changes.
pub type ChangeCallback = Box<dyn Fn(WatcherId) + Send + Sync + 'static>;

/// One live poller and the bookkeeping around it.
///
/// Dropping this stops the underlying polling.
pub struct ActiveWatcher {
    id: WatcherId,
    entry_path: String,
    resolved_path: PathBuf,
    interval_ms: u64,
    _poller: PollWatcher,
}

impl ActiveWatcher {
    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// The registered entry path this watcher was started for.
    pub fn entry_path(&self) -> &str {
        &self.entry_path
    }

    /// The concrete file being polled, after symlink resolution.
    pub fn resolved_path(&self) -> &Path {
        &self.resolved_path
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl fmt::Debug for ActiveWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveWatcher")
            .field("id", &self.id)
            .field("entry_path", &self.entry_path)
            .field("resolved_path", &self.resolved_path)
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}

/// Owns the set of live watchers, keyed by entry path.
///
/// Each started entry gets its own [`PollWatcher`] that rescans the resolved
/// file on the configured interval, comparing mtime and contents, and reports
/// changes through the entry's callback. Dropping the watcher deregisters the
/// polling, so `stop` is just a map removal.
///
/// Callbacks run on the poll thread and carry the [`WatcherId`] assigned at
/// start time. Consumers compare that id against [`WatcherEngine::is_current`]
/// before acting, which makes events from a stopped or restarted watcher easy
/// to drop even if they were already queued.
#[derive(Debug)]
pub struct WatcherEngine {
    base_dir: PathBuf,
    live: HashMap<String, ActiveWatcher>,
    next_id: WatcherId,
}

impl WatcherEngine {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            live: HashMap::new(),
            next_id: 1,
        }
    }

    /// Starts polling for one entry.
    ///
    /// Resolves the entry path (one symlink level), validates it names an
    /// existing regular file, and registers a poller on the given interval.
    /// Starting an entry that is already live replaces its watcher under a
    /// fresh id. Once started, later disappearance of the file is an event,
    /// not an error.
    pub fn start(
        &mut self,
        entry: &WatchEntry,
        interval_ms: u64,
        on_change: ChangeCallback,
    ) -> Result<WatcherId> {
        let resolved = resolve_watch_path(&self.base_dir, &entry.path)?;
        let id = self.next_id;
        self.next_id += 1;

        let poller = spawn_poller(&resolved, interval_ms, id, on_change)?;
        debug!(
            file = %entry.path,
            resolved = ?resolved,
            watcher_id = id,
            interval_ms,
            "poll watcher started"
        );
        self.live.insert(
            entry.path.clone(),
            ActiveWatcher {
                id,
                entry_path: entry.path.clone(),
                resolved_path: resolved,
                interval_ms,
                _poller: poller,
            },
        );
        Ok(id)
    }

    /// Stops the watcher for `path` if one is live. Safe to call for paths
    /// that were never started.
    pub fn stop(&mut self, path: &str) -> bool {
        match self.live.remove(path) {
            Some(watcher) => {
                debug!(file = %path, watcher_id = watcher.id, "poll watcher stopped");
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        if !self.live.is_empty() {
            debug!(count = self.live.len(), "stopping all poll watchers");
        }
        self.live.clear();
    }

    /// Tears everything down and starts fresh watchers for every entry whose
    /// active flag is set. One entry failing does not stop the others; all
    /// failures are collected and returned.
    pub fn restart_all(
        &mut self,
        entries: &[WatchEntry],
        interval_ms: u64,
        mut make_callback: impl FnMut(&str) -> ChangeCallback,
    ) -> Vec<(String, WatchError)> {
        self.stop_all();
        let mut failures = Vec::new();
        for entry in entries.iter().filter(|entry| entry.active) {
            if let Err(err) = self.start(entry, interval_ms, make_callback(&entry.path)) {
                failures.push((entry.path.clone(), err));
            }
        }
        failures
    }

    pub fn watcher(&self, path: &str) -> Option<&ActiveWatcher> {
        self.live.get(path)
    }

    pub fn is_live(&self, path: &str) -> bool {
        self.live.contains_key(path)
    }

    /// True when `id` is the id of the currently live watcher for `path`.
    /// Events failing this check come from a stopped or replaced watcher.
    pub fn is_current(&self, path: &str, id: WatcherId) -> bool {
        self.live.get(path).is_some_and(|watcher| watcher.id == id)
    }

    pub fn live_watchers(&self) -> impl Iterator<Item = &ActiveWatcher> {
        self.live.values()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

/// Registers OS-level polling on `path` and wires change events into the
/// callback. Delete followed by recreate shows up as a change; plain deletes
/// are ignored so a file mid-rewrite never triggers a reload of nothing.
fn spawn_poller(
    path: &Path,
    interval_ms: u64,
    id: WatcherId,
    on_change: ChangeCallback,
) -> Result<PollWatcher> {
    // The poll backend tracks mtime at whole-second granularity; comparing
    // contents is what catches a rewrite landing in the same second as the
    // previous scan.
    let config = Config::default()
        .with_compare_contents(true)
        .with_poll_interval(Duration::from_millis(interval_ms));
    let mut poller = PollWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event.kind.is_modify() || event.kind.is_create() {
                    on_change(id);
                }
            }
            Err(err) => {
                // We can't log via tracing here easily (poll thread), so fall
                // back to stderr. Poll errors are transient.
                eprintln!("filepulse: watch error: {err}");
            }
        },
        config,
    )?;
    poller.watch(path, RecursiveMode::NonRecursive)?;
    Ok(poller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn noop() -> ChangeCallback {
        Box::new(|_| {})
    }

    #[test]
    fn start_validates_and_tracks_the_watcher() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.css"), "body {}").unwrap();

        let mut engine = WatcherEngine::new(dir.path());
        let id = engine
            .start(&WatchEntry::new("a.css"), 200, noop())
            .unwrap();

        assert!(engine.is_live("a.css"));
        assert!(engine.is_current("a.css", id));
        let watcher = engine.watcher("a.css").unwrap();
        assert_eq!(watcher.entry_path(), "a.css");
        assert_eq!(watcher.resolved_path(), dir.path().join("a.css"));
        assert_eq!(watcher.interval_ms(), 200);
    }

    #[test]
    fn start_missing_file_fails_with_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = WatcherEngine::new(dir.path());

        let err = engine
            .start(&WatchEntry::new("ghost.css"), 200, noop())
            .unwrap_err();
        assert!(matches!(err, WatchError::NotFound(_)));
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn start_directory_fails_with_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("themes")).unwrap();

        let mut engine = WatcherEngine::new(dir.path());
        let err = engine
            .start(&WatchEntry::new("themes"), 200, noop())
            .unwrap_err();
        assert!(matches!(err, WatchError::NotAFile(_)));
    }

    #[test]
    fn restart_assigns_a_fresh_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.css"), "body {}").unwrap();

        let mut engine = WatcherEngine::new(dir.path());
        let entry = WatchEntry::new("a.css");
        let first = engine.start(&entry, 200, noop()).unwrap();
        let second = engine.start(&entry, 200, noop()).unwrap();

        assert_ne!(first, second);
        assert!(!engine.is_current("a.css", first));
        assert!(engine.is_current("a.css", second));
        assert_eq!(engine.live_count(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.css"), "body {}").unwrap();

        let mut engine = WatcherEngine::new(dir.path());
        engine.start(&WatchEntry::new("a.css"), 200, noop()).unwrap();

        assert!(engine.stop("a.css"));
        assert!(!engine.stop("a.css"));
        assert!(!engine.is_live("a.css"));
    }

    #[test]
    fn restart_all_skips_inactive_and_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.css"), "body {}").unwrap();
        fs::write(dir.path().join("b.css"), "p {}").unwrap();

        let entries = vec![
            WatchEntry::new("a.css"),
            WatchEntry {
                path: "b.css".into(),
                active: false,
            },
            WatchEntry::new("ghost.css"),
        ];

        let mut engine = WatcherEngine::new(dir.path());
        let failures = engine.restart_all(&entries, 350, |_| noop());

        assert_eq!(engine.live_count(), 1);
        assert!(engine.is_live("a.css"));
        assert!(!engine.is_live("b.css"));
        // Fresh watchers pick up the interval passed to the restart.
        assert_eq!(engine.watcher("a.css").unwrap().interval_ms(), 350);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "ghost.css");
        assert!(matches!(failures[0].1, WatchError::NotFound(_)));
    }
}
