// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod host;
pub mod logging;
pub mod manager;
pub mod registry;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::cli::{CliArgs, Command};
use crate::config::{DEFAULT_INTERVAL_MS, JsonSettingsStore};
use crate::host::CacheHost;
use crate::manager::{ManagerEvent, WatchManager};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading through the JSON store
/// - the watch manager and its poll watchers
/// - (for `watch`) signal handling and the manager event loop
pub async fn run(args: CliArgs) -> Result<()> {
    let settings_path = PathBuf::from(&args.settings);
    let base_dir = match &args.base_dir {
        Some(dir) => PathBuf::from(dir),
        None => settings_root_dir(&settings_path),
    };
    let base_dir = base_dir.canonicalize().unwrap_or(base_dir);

    let host = Arc::new(CacheHost::new(base_dir));
    let store = Box::new(JsonSettingsStore::new(settings_path));
    let mut manager = WatchManager::new(host, store);

    match args.command {
        Command::Add { path } => {
            manager.add(&path)?;
            println!("added '{path}'");
        }
        Command::Remove { path } => {
            if manager.contains(&path) {
                manager.remove(&path)?;
                println!("removed '{path}'");
            } else {
                println!("no watch entry for '{path}'");
            }
        }
        Command::Enable { path } => {
            if manager.contains(&path) {
                manager.activate(&path)?;
                println!("enabled '{path}'");
            } else {
                println!("no watch entry for '{path}'");
            }
        }
        Command::Disable { path } => {
            if manager.contains(&path) {
                manager.deactivate(&path)?;
                println!("disabled '{path}'");
            } else {
                println!("no watch entry for '{path}'");
            }
        }
        Command::Interval { millis } => {
            let requested = millis.parse::<u64>().unwrap_or_else(|_| {
                warn!(input = %millis, "interval is not a number, using default");
                DEFAULT_INTERVAL_MS
            });
            manager.set_interval(requested)?;
            println!("poll interval set to {} ms", manager.interval_ms());
        }
        Command::List => print_status(&manager),
        Command::Watch { preload } => watch_until_interrupted(&mut manager, preload).await?,
    }
    Ok(())
}

/// Brings all active entries live, installs signal handling, and runs the
/// manager loop until Ctrl+C.
async fn watch_until_interrupted(manager: &mut WatchManager, preload: bool) -> Result<()> {
    let failures = manager.restart_all();
    if !failures.is_empty() {
        warn!(failed = failures.len(), "some watchers did not start");
    }
    if preload {
        manager.preload();
    }
    print_status(manager);

    // Ctrl+C requests a clean shutdown through the event channel.
    let shutdown_tx = manager.event_sender();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            eprintln!("filepulse: failed to listen for Ctrl+C: {err}");
            return;
        }
        let _ = shutdown_tx.send(ManagerEvent::ShutdownRequested);
    });

    // SIGHUP tears down and restarts every active watcher, recovering
    // entries whose files were missing when the session started.
    #[cfg(unix)]
    {
        let restart_tx = manager.event_sender();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let mut hangup = match signal(SignalKind::hangup()) {
                Ok(stream) => stream,
                Err(err) => {
                    eprintln!("filepulse: failed to install SIGHUP handler: {err}");
                    return;
                }
            };
            while hangup.recv().await.is_some() {
                let _ = restart_tx.send(ManagerEvent::RestartRequested);
            }
        });
    }

    manager.run().await?;
    Ok(())
}

fn print_status(manager: &WatchManager) {
    let statuses = manager.list();
    println!("watch entries ({}):", statuses.len());
    for status in &statuses {
        let active = if status.active { "active" } else { "inactive" };
        let live = if status.live { "live" } else { "-" };
        println!("  {:<40} {:<8} {}", status.path, active, live);
    }
    println!("poll interval: {} ms", manager.interval_ms());
}

/// Directory the settings file lives in; watch paths resolve against it
/// unless `--base-dir` says otherwise.
fn settings_root_dir(settings_path: &Path) -> PathBuf {
    settings_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
