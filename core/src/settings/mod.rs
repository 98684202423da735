//! Injectable view settings shared by the UI (theme, volume, sidebar, path bar).
//!
//! One [`SettingsStore`] is built at startup and handed to every consumer. Consumers hold a
//! [`watch::Receiver`] and are woken only when a value actually changes.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

pub const MIN_SIDEBAR_WIDTH: u32 = 200;
pub const MAX_SIDEBAR_WIDTH: u32 = 600;
pub const DEFAULT_SIDEBAR_WIDTH: u32 = 280;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    /// Playback volume in `0.0..=1.0`.
    pub volume: f32,
    pub muted: bool,
    pub sidebar_width: u32,
    pub path_bar_visible: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            volume: 1.0,
            muted: false,
            sidebar_width: DEFAULT_SIDEBAR_WIDTH,
            path_bar_visible: true,
        }
    }
}

impl Settings {
    /// Replace out-of-range values with their defaults.
    fn sanitized(mut self) -> Self {
        if !self.volume.is_finite() {
            self.volume = 1.0;
        }
        self.volume = self.volume.clamp(0.0, 1.0);
        if !(MIN_SIDEBAR_WIDTH..=MAX_SIDEBAR_WIDTH).contains(&self.sidebar_width) {
            self.sidebar_width = DEFAULT_SIDEBAR_WIDTH;
        }
        self
    }
}

#[derive(Debug)]
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore {
    pub fn new(initial: Settings) -> Self {
        let (tx, _rx) = watch::channel(initial.sanitized());
        Self { tx }
    }

    /// Build the store from `loader`, falling back to defaults if it fails.
    pub fn load_or_default<F>(loader: F) -> Self
    where
        F: FnOnce() -> crate::Result<Settings>,
    {
        match loader() {
            Ok(settings) => Self::new(settings),
            Err(err) => {
                warn!(error = %err, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn current(&self) -> Settings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    pub fn toggle_theme(&self) -> Theme {
        self.update(|settings| {
            settings.theme = settings.theme.toggled();
            true
        });
        self.tx.borrow().theme
    }

    /// Set the volume, clamped to `0.0..=1.0`. A volume of zero also mutes.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { return };
        self.update(|settings| {
            let muted = volume == 0.0;
            let changed = settings.volume != volume || settings.muted != muted;
            settings.volume = volume;
            settings.muted = muted;
            changed
        });
    }

    pub fn set_muted(&self, muted: bool) {
        self.update(|settings| std::mem::replace(&mut settings.muted, muted) != muted);
    }

    /// Returns `false` and leaves the width alone when it is outside the allowed range.
    pub fn set_sidebar_width(&self, width: u32) -> bool {
        if !(MIN_SIDEBAR_WIDTH..=MAX_SIDEBAR_WIDTH).contains(&width) {
            debug!(width, "ignoring sidebar width outside allowed range");
            return false;
        }
        self.update(|settings| std::mem::replace(&mut settings.sidebar_width, width) != width);
        true
    }

    pub fn set_path_bar_visible(&self, visible: bool) {
        self.update(|settings| {
            std::mem::replace(&mut settings.path_bar_visible, visible) != visible
        });
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Settings) -> bool,
    {
        if self.tx.send_if_modified(apply) {
            debug!("settings changed");
        }
    }
}
