//! Core library for the Meridian media browser: path encoding, directory scanning, and
//! bounded-concurrency load scheduling.

#![deny(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod fs;
pub mod log;
pub mod pipeline;
pub mod settings;
pub mod stats;
pub mod types;

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub use error::{QueueError, ScanError};
pub use fs::{scan_directory, scan_directory_async, to_app_path, to_native_path};
pub use pipeline::{LoadHandle, LoadQueue, PathLoadQueue};
pub use types::{AppPath, DirectoryEntry, EntryKind, ScanOptions, SortMode};

/// Returns the version of the core crate for telemetry and debugging.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
