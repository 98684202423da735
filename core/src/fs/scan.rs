//! One-level directory listing with classification and display ordering.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::types::{DirectoryEntry, EntryKind, ScanOptions, SortMode};

use super::util;

/// List the immediate children of `root`.
///
/// The root must be a readable directory, otherwise the whole call fails. Children that cannot
/// be stat'd are logged and skipped.
pub fn scan_directory(root: &Path, options: ScanOptions) -> Result<Vec<DirectoryEntry>, ScanError> {
    let metadata = fs::metadata(root)
        .map_err(|source| ScanError::PathNotAccessible { path: root.to_path_buf(), source })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory { path: root.to_path_buf() });
    }

    let reader = fs::read_dir(root)
        .map_err(|source| ScanError::PathNotAccessible { path: root.to_path_buf(), source })?;

    let mut entries = Vec::new();
    let mut skipped = 0usize;
    for dirent in reader {
        let dirent = match dirent {
            Ok(dirent) => dirent,
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable directory entry");
                skipped += 1;
                continue;
            }
        };

        match read_entry(dirent.path()) {
            Ok(entry) => {
                if options.filter_non_media && !entry.kind.is_listed_when_filtered() {
                    continue;
                }
                entries.push(entry);
            }
            Err(err) => {
                warn!(path = %dirent.path().display(), error = %err, "cannot stat entry, skipping");
                skipped += 1;
            }
        }
    }

    sort_entries(&mut entries, options.sort_mode);
    info!(root = %root.display(), listed = entries.len(), skipped, "scanned directory");
    Ok(entries)
}

/// Run [`scan_directory`] on the blocking pool. A panic inside the scan is resumed on the
/// caller.
pub async fn scan_directory_async(
    root: PathBuf,
    options: ScanOptions,
) -> Result<Vec<DirectoryEntry>, ScanError> {
    let path = root.clone();
    match tokio::task::spawn_blocking(move || scan_directory(&root, options)).await {
        Ok(result) => result,
        Err(join_err) => Err(join_failure(path, join_err)),
    }
}

fn join_failure(path: PathBuf, join_err: JoinError) -> ScanError {
    match join_err.try_into_panic() {
        Ok(payload) => panic::resume_unwind(payload),
        Err(_) => ScanError::Cancelled { path },
    }
}

fn read_entry(path: PathBuf) -> io::Result<DirectoryEntry> {
    let metadata = fs::metadata(&path)?;
    let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let modified_time = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    let (kind, size) = if metadata.is_dir() {
        (EntryKind::Directory, 0)
    } else {
        (util::classify_file(&path), metadata.len())
    };

    Ok(DirectoryEntry { path, kind, name, size, modified_time })
}

/// Directories first, then files; each group ordered by `mode`.
pub fn sort_entries(entries: &mut [DirectoryEntry], mode: SortMode) {
    entries.sort_by(|a, b| compare_entries(a, b, mode));
    debug!(count = entries.len(), ?mode, "sorted entries");
}

fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry, mode: SortMode) -> Ordering {
    let group = b.kind.is_directory().cmp(&a.kind.is_directory());
    group.then_with(|| match mode {
        SortMode::Name => util::natural_cmp_names(&a.name, &b.name),
        SortMode::ModifiedDesc => b
            .modified_time
            .cmp(&a.modified_time)
            .then_with(|| util::natural_cmp_names(&a.name, &b.name)),
    })
}
