//! Typed errors surfaced by the scanner and the load queue.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a whole directory scan. Individual unreadable entries never produce one.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("directory not accessible: {}", path.display())]
    PathNotAccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// The blocking scan task was cancelled before it produced a listing.
    #[error("scan of {} was cancelled", path.display())]
    Cancelled { path: PathBuf },
}

impl ScanError {
    /// The root itself cannot be listed; the UI treats both cases alike.
    pub fn is_not_accessible(&self) -> bool {
        matches!(self, ScanError::PathNotAccessible { .. } | ScanError::NotADirectory { .. })
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            ScanError::PathNotAccessible { path, .. }
            | ScanError::NotADirectory { path }
            | ScanError::Cancelled { path } => path,
        }
    }
}

/// Errors produced by [`crate::pipeline::LoadQueue`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("load queue capacity must be greater than zero")]
    InvalidCapacity,

    #[error("load queue must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("loader panicked while loading {key}")]
    LoaderPanicked { key: String },

    #[error("load task was dropped before it settled")]
    Abandoned,
}
