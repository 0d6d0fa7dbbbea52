// src/watch/mod.rs

//! File polling: path resolution and the live watcher set.
//!
//! - `resolve` turns a registered entry path into the concrete file to poll,
//!   following a single symlink level.
//! - `engine` owns one [`PollWatcher`](notify::PollWatcher) per started entry
//!   and hands change events to per-entry callbacks.

pub mod engine;
pub mod resolve;

pub use engine::{ActiveWatcher, ChangeCallback, WatcherEngine, WatcherId};
pub use resolve::resolve_watch_path;
