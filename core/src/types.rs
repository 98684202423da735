//! Shared data structures exchanged between the core and the UI layer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fs::path::{APP_PATH_SEPARATOR, to_app_path, to_native_path, to_native_path_with};

/// Canonical, platform-independent path used as the identity of a filesystem location.
///
/// Segments are joined with [`APP_PATH_SEPARATOR`]; the value never starts or ends with the
/// separator and never contains `/` or `\`. Deserialised values are re-encoded, so a string
/// from the UI is canonical before it is compared or used as a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AppPath(String);

impl<'de> Deserialize<'de> for AppPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(to_app_path(&to_native_path_with(&raw, '/')))
    }
}

impl AppPath {
    pub(crate) fn from_canonical(value: String) -> Self {
        Self(value)
    }

    /// Encode a native path. Non UTF-8 components are replaced lossily.
    pub fn from_native(path: impl AsRef<Path>) -> Self {
        to_app_path(&path.as_ref().to_string_lossy())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode back into a path using the platform separator.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(to_native_path(&self.0))
    }

    /// Non-empty segments, root first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(APP_PATH_SEPARATOR).filter(|segment| !segment.is_empty())
    }

    /// Every segment paired with the path leading up to and including it, as shown in a path bar.
    pub fn breadcrumbs(&self) -> Vec<(String, AppPath)> {
        let mut prefix = String::new();
        self.segments()
            .map(|segment| {
                if !prefix.is_empty() {
                    prefix.push(APP_PATH_SEPARATOR);
                }
                prefix.push_str(segment);
                (segment.to_string(), AppPath(prefix.clone()))
            })
            .collect()
    }

    /// Path without its last segment, or `None` at the top level.
    pub fn parent(&self) -> Option<AppPath> {
        self.0.rsplit_once(APP_PATH_SEPARATOR).map(|(head, _)| AppPath(head.to_string()))
    }

    /// Append a child segment; native separators inside `segment` are normalised too.
    pub fn join(&self, segment: &str) -> AppPath {
        let child = to_app_path(segment);
        match (self.is_empty(), child.is_empty()) {
            (_, true) => self.clone(),
            (true, false) => child,
            (false, false) => AppPath(format!("{}{APP_PATH_SEPARATOR}{}", self.0, child.0)),
        }
    }
}

impl fmt::Display for AppPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AppPath> for String {
    fn from(value: AppPath) -> Self {
        value.0
    }
}

/// Classification of a directory child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    Image,
    Video,
    Text,
    Other,
}

impl EntryKind {
    pub fn is_directory(self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Whether the entry survives a scan with non-media filtering enabled.
    pub fn is_listed_when_filtered(self) -> bool {
        !matches!(self, EntryKind::Other)
    }
}

/// One immediate child of a scanned directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub size: u64,
    /// Serialised as milliseconds since the Unix epoch.
    #[serde(serialize_with = "serialize_epoch_millis")]
    pub modified_time: SystemTime,
}

fn serialize_epoch_millis<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let millis = time.duration_since(SystemTime::UNIX_EPOCH).map_or(0, |since| since.as_millis());
    serializer.serialize_u64(u64::try_from(millis).unwrap_or(u64::MAX))
}

impl DirectoryEntry {
    /// Canonical identity of the entry, used as the key for load queues and view state.
    pub fn app_path(&self) -> AppPath {
        AppPath::from_native(&self.path)
    }
}

/// Ordering applied within the directory group and within the file group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Case-insensitive natural order of names (`file2` before `file10`).
    #[default]
    Name,
    /// Most recently modified first.
    ModifiedDesc,
}

impl std::str::FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" | "natural" => Ok(SortMode::Name),
            "modified" | "modified_desc" | "time" => Ok(SortMode::ModifiedDesc),
            other => Err(anyhow::anyhow!("unknown sort mode {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Drop entries classified as [`EntryKind::Other`].
    pub filter_non_media: bool,
    pub sort_mode: SortMode,
}

impl ScanOptions {
    pub fn filtered(mut self, filter_non_media: bool) -> Self {
        self.filter_non_media = filter_non_media;
        self
    }

    pub fn sorted_by(mut self, sort_mode: SortMode) -> Self {
        self.sort_mode = sort_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumbs_accumulate_prefixes() {
        let path = to_app_path("D:\\Photos\\2024");
        let crumbs = path.breadcrumbs();
        let prefixes: Vec<&str> = crumbs.iter().map(|(_, prefix)| prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["D:", "D:>Photos", "D:>Photos>2024"]);
        assert_eq!(crumbs[1].0, "Photos");
    }

    #[test]
    fn parent_and_join_are_inverse_for_single_segments() {
        let base = to_app_path("/srv/media");
        let child = base.join("clips");
        assert_eq!(child.as_str(), "srv>media>clips");
        assert_eq!(child.parent(), Some(base));
        assert_eq!(to_app_path("srv").parent(), None);
        assert_eq!(AppPath::default().join("a/b").as_str(), "a>b");
    }

    #[test]
    fn sort_mode_parses_aliases() {
        assert_eq!("Name".parse::<SortMode>().unwrap(), SortMode::Name);
        assert_eq!("modified".parse::<SortMode>().unwrap(), SortMode::ModifiedDesc);
        assert!("size".parse::<SortMode>().is_err());
    }

    #[test]
    fn entry_kind_serialises_lowercase() {
        let json = serde_json::to_string(&EntryKind::Directory).unwrap();
        assert_eq!(json, "\"directory\"");
    }

    #[test]
    fn entry_serialises_for_the_ui() {
        let entry = DirectoryEntry {
            path: PathBuf::from("clip.mp4"),
            kind: EntryKind::Video,
            name: "clip.mp4".to_string(),
            size: 10,
            modified_time: SystemTime::UNIX_EPOCH
                + std::time::Duration::from_millis(1_700_000_000_123),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "video");
        assert_eq!(value["modifiedTime"], 1_700_000_000_123u64);
    }
}
