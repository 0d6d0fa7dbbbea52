// src/config/mod.rs

//! Settings blob model and persistence.
//!
//! - `model` defines the serialized [`WatchSettings`] shape and the interval
//!   bounds.
//! - `store` holds the [`SettingsStore`] trait plus the JSON-file and
//!   in-memory implementations.

pub mod model;
pub mod store;

pub use model::{
    DEFAULT_INTERVAL_MS, MAX_INTERVAL_MS, MIN_INTERVAL_MS, WatchSettings, clamp_interval,
};
pub use store::{InMemorySettingsStore, JsonSettingsStore, SettingsStore};
