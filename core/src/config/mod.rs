//! Runtime configuration: a JSON file in the platform config directory plus environment
//! overrides.
//!
//! Every field has a default, so a partial or missing file is fine. Environment variables win
//! over the file:
//!
//! | variable                               | field                         |
//! |----------------------------------------|-------------------------------|
//! | `MERIDIAN_IMAGE_LOAD_CONCURRENCY`      | `image_load_concurrency`      |
//! | `MERIDIAN_VIDEO_THUMBNAIL_CONCURRENCY` | `video_thumbnail_concurrency` |
//! | `MERIDIAN_FILTER_NON_MEDIA`            | `filter_non_media`            |
//! | `MERIDIAN_SORT_MODE`                   | `sort_mode`                   |

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::log::{LogConfig, LogLevel, LogRolling};
use crate::types::{ScanOptions, SortMode};

pub(crate) const APP_QUALIFIER: &str = "com";
pub(crate) const APP_ORGANISATION: &str = "Meridian";
pub(crate) const APP_NAME: &str = "meridian";

const CONFIG_FILE_NAME: &str = "config.json";

/// Logging options as written in the config file. Levels use `tracing` names (`info`, `debug`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
    pub retention: Option<usize>,
    pub file_level: String,
    pub console_level: Option<String>,
    pub filter: Option<String>,
    pub rolling: LogRolling,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            directory: None,
            file_prefix: APP_NAME.to_string(),
            retention: Some(14),
            file_level: "debug".to_string(),
            console_level: None,
            filter: None,
            rolling: LogRolling::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Simultaneous full-size image loads in the viewer.
    pub image_load_concurrency: usize,
    /// Simultaneous video thumbnail extractions in the grid.
    pub video_thumbnail_concurrency: usize,
    pub filter_non_media: bool,
    pub sort_mode: SortMode,
    pub log: LogSection,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            image_load_concurrency: 5,
            video_thumbnail_concurrency: 10,
            filter_non_media: false,
            sort_mode: SortMode::Name,
            log: LogSection::default(),
        }
    }
}

impl CoreConfig {
    /// Read and validate a config file. The file must exist.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: CoreConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from the platform config directory, falling back to defaults when no file exists,
    /// then apply environment overrides.
    pub fn load_or_default() -> crate::Result<Self> {
        let mut config = match default_config_path() {
            Some(path) => match Self::load(&path) {
                Ok(config) => config,
                Err(err) if is_not_found(&err) => {
                    info!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
                Err(err) => return Err(err),
            },
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> crate::Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MERIDIAN_IMAGE_LOAD_CONCURRENCY") {
            self.image_load_concurrency = parse_var("MERIDIAN_IMAGE_LOAD_CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("MERIDIAN_VIDEO_THUMBNAIL_CONCURRENCY") {
            self.video_thumbnail_concurrency =
                parse_var("MERIDIAN_VIDEO_THUMBNAIL_CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("MERIDIAN_FILTER_NON_MEDIA") {
            self.filter_non_media = parse_var("MERIDIAN_FILTER_NON_MEDIA", &value)?;
        }
        if let Some(value) = lookup("MERIDIAN_SORT_MODE") {
            self.sort_mode = value.parse::<SortMode>().context("MERIDIAN_SORT_MODE")?;
        }
        self.validate()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.image_load_concurrency == 0 {
            bail!("image_load_concurrency must be greater than zero");
        }
        if self.video_thumbnail_concurrency == 0 {
            bail!("video_thumbnail_concurrency must be greater than zero");
        }
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions { filter_non_media: self.filter_non_media, sort_mode: self.sort_mode }
    }

    /// Resolve the logging section into a [`LogConfig`], keeping defaults for unset fields.
    pub fn log_config(&self) -> crate::Result<LogConfig> {
        let section = &self.log;
        let mut config = LogConfig::default().with_prefix(section.file_prefix.clone());
        if let Some(directory) = &section.directory {
            config = config.with_directory(directory.clone());
        }
        config.retention = section.retention;
        config.rolling = section.rolling;
        config.file_level = parse_level(&section.file_level)?;
        if let Some(level) = &section.console_level {
            config.console_level = parse_level(level)?;
        }
        if section.filter.is_some() {
            config.env_filter = section.filter.clone();
        }
        Ok(config)
    }
}

/// `<config dir>/config.json` for the current user, if a home directory can be resolved.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_var<T>(name: &str, value: &str) -> crate::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|err| anyhow!("invalid value {value:?} for {name}: {err}"))
}

fn parse_level(value: &str) -> crate::Result<LogLevel> {
    value.trim().parse::<LogLevel>().map_err(|err| anyhow!("invalid log level {value:?}: {err}"))
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>().is_some_and(|io_err| io_err.kind() == io::ErrorKind::NotFound)
}
