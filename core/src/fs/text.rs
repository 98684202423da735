//! Read-only helpers used by the viewer: text previews and drive roots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::types::EntryKind;

use super::{Result, util};

/// UTF-8 contents of a text-classified file, or `None` for any other kind.
pub fn read_text_file(path: &Path) -> Result<Option<String>> {
    if util::classify_file(path) != EntryKind::Text {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("reading text file {}", path.display()))?;
    Ok(Some(content))
}

/// Roots the navigation tree starts from.
#[cfg(windows)]
pub fn list_drive_roots() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|root| root.exists())
        .collect()
}

/// Roots the navigation tree starts from.
#[cfg(not(windows))]
pub fn list_drive_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("/")]
}
