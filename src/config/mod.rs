use crate::playback::BASE_DURATION_MS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Slowest and fastest settings offered by the speed control
pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 10;

/// Persistent replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Time for a full route at 1x, in milliseconds
    pub base_duration_ms: u64,
    /// Speed preselected in the control (1-10)
    pub default_speed: u32,
    /// Delay between ticks, roughly one display refresh
    pub frame_interval_ms: u64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            base_duration_ms: BASE_DURATION_MS,
            default_speed: 5,
            frame_interval_ms: 16,
        }
    }
}

impl ReplaySettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("route-replay").join("settings.json"))
    }

    /// Load from the user config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring unreadable settings at {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {:?}", path))?;
        Ok(settings.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Pull out-of-range values back to something playable
    pub fn sanitized(mut self) -> Self {
        self.default_speed = self.default_speed.clamp(MIN_SPEED, MAX_SPEED);
        if self.frame_interval_ms == 0 {
            self.frame_interval_ms = Self::default().frame_interval_ms;
        }
        self
    }

    /// Copy with `speed` as the default, rounded into the control's range
    pub fn with_default_speed(&self, speed: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            anyhow::bail!("Refusing to save invalid speed {}", speed);
        }
        let mut settings = self.clone();
        settings.default_speed = (speed.round() as u32).clamp(MIN_SPEED, MAX_SPEED);
        Ok(settings)
    }

    pub fn base_duration(&self) -> Duration {
        Duration::from_millis(self.base_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
