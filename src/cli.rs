// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `filepulse`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "filepulse",
    version,
    about = "Watch registered files and reload them on change"
)]
pub struct CliArgs {
    /// Path to the JSON settings blob.
    #[arg(long, value_name = "FILE", default_value = "Filepulse.json")]
    pub settings: String,

    /// Base directory watch paths resolve against. Defaults to the settings
    /// file's directory.
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<String>,

    /// Log verbosity. Overrides the FILEPULSE_LOG environment variable.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Register a file for watching. The file must exist and be a regular
    /// file; the new entry starts out active.
    Add {
        /// Path relative to the base directory.
        path: String,
    },
    /// Remove a watch entry. Unknown paths are ignored.
    Remove {
        path: String,
    },
    /// Re-enable a disabled entry.
    Enable {
        path: String,
    },
    /// Disable an entry without removing it.
    Disable {
        path: String,
    },
    /// Set the poll interval in milliseconds (clamped to 100..=10000).
    /// Non-numeric values fall back to the default of 200.
    Interval {
        millis: String,
    },
    /// Show all entries with their active and live status.
    List,
    /// Watch all active entries until interrupted. SIGHUP restarts every
    /// watcher; Ctrl+C exits.
    Watch {
        /// Reload every watched file once at startup.
        #[arg(long)]
        preload: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
