//! Tracing bootstrap for the media browser.
//!
//! `init` installs a registry with two sinks: a non-blocking rolling file under the user's data
//! directory and a stderr console. Records emitted through the `log` crate are bridged into
//! `tracing`. The first successful call wins; later calls return the installed handle.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing_appender::rolling::Rotation;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

use crate::config::{APP_NAME, APP_ORGANISATION, APP_QUALIFIER};

/// Checked in order when the config does not carry a filter directive.
const FILTER_ENV_VARS: [&str; 2] = ["MERIDIAN_LOG", "RUST_LOG"];

static LOG_HANDLE: OnceLock<LogHandle> = OnceLock::new();

pub use tracing_subscriber::filter::LevelFilter as LogLevel;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRolling {
    Hourly,
    #[default]
    Daily,
    /// Single append-only file.
    Never,
}

impl LogRolling {
    fn rotation(self) -> Rotation {
        match self {
            LogRolling::Hourly => Rotation::HOURLY,
            LogRolling::Daily => Rotation::DAILY,
            LogRolling::Never => Rotation::NEVER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub directory: PathBuf,
    /// Generated files are named `<prefix>.<date>.log`.
    pub file_prefix: String,
    /// Keep at most this many files matching the prefix. `None` keeps everything.
    pub retention: Option<usize>,
    pub file_level: LogLevel,
    pub console_level: LogLevel,
    pub capture_log: bool,
    /// Directive such as `meridian_core=debug`.
    pub env_filter: Option<String>,
    pub rolling: LogRolling,
}

impl Default for LogConfig {
    fn default() -> Self {
        let console_level = if cfg!(debug_assertions) { LogLevel::INFO } else { LogLevel::WARN };

        Self {
            directory: default_log_directory(),
            file_prefix: APP_NAME.to_string(),
            retention: Some(14),
            file_level: LogLevel::DEBUG,
            console_level,
            capture_log: true,
            env_filter: None,
            rolling: LogRolling::Daily,
        }
    }
}

impl LogConfig {
    pub fn with_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.directory = path.into();
        self
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    fn filter_directive(&self) -> String {
        self.env_filter
            .clone()
            .or_else(|| FILTER_ENV_VARS.iter().find_map(|var| std::env::var(var).ok()))
            .filter(|directive| !directive.trim().is_empty())
            .unwrap_or_else(|| if cfg!(debug_assertions) { "debug" } else { "info" }.to_string())
    }
}

/// Owns the background writer; dropping it would stop file logging, so it lives in a static.
#[derive(Debug)]
pub struct LogHandle {
    _guard: tracing_appender::non_blocking::WorkerGuard,
    directory: PathBuf,
    file_prefix: String,
}

impl LogHandle {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_prefix(&self) -> &str {
        &self.file_prefix
    }
}

pub fn init(config: LogConfig) -> Result<&'static LogHandle> {
    if let Some(handle) = LOG_HANDLE.get() {
        return Ok(handle);
    }

    let handle = install(config)?;
    // Lost a race with another initialiser: its handle is the installed one.
    let _ = LOG_HANDLE.set(handle);
    LOG_HANDLE.get().context("log handle missing after initialisation")
}

fn install(config: LogConfig) -> Result<LogHandle> {
    if config.capture_log {
        bridge_log_records(config.file_level.max(config.console_level));
    }

    fs::create_dir_all(&config.directory)
        .with_context(|| format!("creating log directory at {}", config.directory.display()))?;

    if let Some(retention) = config.retention.filter(|keep| *keep > 0) {
        prune_old_logs(&config.directory, &config.file_prefix, retention)
            .context("applying log retention policy")?;
    }

    let appender = tracing_appender::rolling::Builder::new()
        .rotation(config.rolling.rotation())
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .build(&config.directory)
        .context("creating rolling log appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_new(config.filter_directive()).context("parsing log filter directive")?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_file(true)
        .with_line_number(true)
        .with_filter(config.file_level);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(config.console_level);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(LogHandle { _guard: guard, directory: config.directory, file_prefix: config.file_prefix })
}

fn bridge_log_records(max_level: LogLevel) {
    let log_level = match max_level {
        LogLevel::OFF => log::LevelFilter::Off,
        LogLevel::ERROR => log::LevelFilter::Error,
        LogLevel::WARN => log::LevelFilter::Warn,
        LogLevel::INFO => log::LevelFilter::Info,
        LogLevel::DEBUG => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Another logger may already own the `log` facade; tracing still works without the bridge.
    let _ = tracing_log::LogTracer::builder().with_max_level(log_level).init();
}

fn prune_old_logs(dir: &Path, prefix: &str, retention: usize) -> Result<()> {
    let mut files: Vec<(PathBuf, SystemTime)> = fs::read_dir(dir)
        .with_context(|| format!("reading log directory at {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let metadata = entry.metadata().ok().filter(|meta| meta.is_file())?;
            let path = entry.path();
            if !has_prefix(&path, prefix) {
                return None;
            }
            Some((path, metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)))
        })
        .collect();

    if files.len() <= retention {
        return Ok(());
    }

    files.sort_by_key(|(_, modified)| *modified);
    let excess = files.len() - retention;
    for (path, _) in files.into_iter().take(excess) {
        let _ = fs::remove_file(&path);
    }

    Ok(())
}

fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name().and_then(OsStr::to_str).is_some_and(|name| name.starts_with(prefix))
}

fn default_log_directory() -> PathBuf {
    match ProjectDirs::from(APP_QUALIFIER, APP_ORGANISATION, APP_NAME) {
        Some(dirs) => dirs.data_dir().join("logs"),
        None => std::env::temp_dir().join("meridian-logs"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config =
            LogConfig::default().with_directory(temp.path().join("logs")).with_prefix("test-log");

        let first = init(config.clone()).expect("init once");
        assert!(first.directory().exists());

        let second = init(config).expect("init twice");
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn pruning_keeps_newest_matching_files() -> Result<()> {
        let temp = tempfile::tempdir()?;
        for (index, name) in ["app.1.log", "app.2.log", "app.3.log"].iter().enumerate() {
            let path = temp.path().join(name);
            fs::write(&path, b"x")?;
            let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000 + index as u64);
            fs::File::options().write(true).open(&path)?.set_modified(stamp)?;
        }
        fs::write(temp.path().join("other.log"), b"x")?;

        prune_old_logs(temp.path(), "app", 2)?;

        assert!(!temp.path().join("app.1.log").exists());
        assert!(temp.path().join("app.2.log").exists());
        assert!(temp.path().join("app.3.log").exists());
        assert!(temp.path().join("other.log").exists());
        Ok(())
    }
}
