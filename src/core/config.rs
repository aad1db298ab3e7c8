use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BridgeError;

/// Service tunables, stored as JSON in the user's config directory.
///
/// Every field falls back to its default when absent from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_interval_ms: u64,
    pub media_idle_interval_ms: u64,
    pub media_playing_interval_ms: u64,
    /// Pause between two module launches within a tick
    pub module_stagger_ms: u64,
    /// How long `shutdown` waits for in-flight collection
    pub shutdown_timeout_ms: u64,
    /// Worker threads of the collection runtime
    pub worker_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_interval_ms: 30_000,
            media_idle_interval_ms: 20_000,
            media_playing_interval_ms: 5_000,
            module_stagger_ms: 1_000,
            shutdown_timeout_ms: 5_000,
            worker_threads: 2,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Ok(Self::load_from(&path))
    }

    /// Read settings from `path`.
    ///
    /// A missing, empty, unreadable or invalid file yields the defaults.
    pub fn load_from(path: &Path) -> Self {
        let data = match fs::read(path) {
            Ok(data) if !data.is_empty() => data,
            _ => return Settings::default(),
        };

        let settings: Settings = match serde_json::from_slice(&data) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring corrupt settings file {:?}: {}", path, e);
                return Settings::default();
            }
        };

        match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file {:?}: {}", path, e);
                Settings::default()
            }
        }
    }

    /// Every schedule interval must be at least one millisecond.
    pub fn validate(&self) -> std::result::Result<(), BridgeError> {
        let intervals = [
            ("data_interval_ms", self.data_interval_ms),
            ("media_idle_interval_ms", self.media_idle_interval_ms),
            ("media_playing_interval_ms", self.media_playing_interval_ms),
        ];

        match intervals.iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(BridgeError::config(format!("{} must be greater than zero", field))),
            None => Ok(()),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::get_config_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize settings")?;

        fs::write(path, data).with_context(|| format!("Failed to write settings file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("sysbridge").join("settings.json"))
    }

    pub fn data_interval(&self) -> Duration {
        Duration::from_millis(self.data_interval_ms)
    }

    pub fn media_idle_interval(&self) -> Duration {
        Duration::from_millis(self.media_idle_interval_ms)
    }

    pub fn media_playing_interval(&self) -> Duration {
        Duration::from_millis(self.media_playing_interval_ms)
    }

    pub fn module_stagger(&self) -> Duration {
        Duration::from_millis(self.module_stagger_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
