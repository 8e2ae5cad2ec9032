use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ArcadeError;
use crate::rewards::DEFAULT_REWARD_THRESHOLD;

pub const DEFAULT_GRID_SIZE: u32 = 20;
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(100);
pub const DEFAULT_FOOD_POINTS: u32 = 10;

pub const MIN_GRID_SIZE: u32 = 5;
pub const MAX_GRID_SIZE: u32 = 64;
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(20);
pub const MIN_REWARD_THRESHOLD: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArcadeSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_tick_period", with = "crate::tick_millis")]
    pub tick_period: Duration,
    #[serde(default = "default_reward_threshold")]
    pub reward_threshold: u32,
    #[serde(default = "default_food_points")]
    pub food_points: u32,
}

impl Default for ArcadeSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            grid_size: DEFAULT_GRID_SIZE,
            tick_period: DEFAULT_TICK_PERIOD,
            reward_threshold: DEFAULT_REWARD_THRESHOLD,
            food_points: DEFAULT_FOOD_POINTS,
        }
    }
}

impl ArcadeSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.grid_size = self.grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        self.tick_period = self.tick_period.max(MIN_TICK_PERIOD);
        self.reward_threshold = self.reward_threshold.max(MIN_REWARD_THRESHOLD);
        self.food_points = self.food_points.max(1);
        self
    }
}

fn default_version() -> u32 {
    1
}

fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}

fn default_tick_period() -> Duration {
    DEFAULT_TICK_PERIOD
}

fn default_reward_threshold() -> u32 {
    DEFAULT_REWARD_THRESHOLD
}

fn default_food_points() -> u32 {
    DEFAULT_FOOD_POINTS
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        Self::resolve(|key| std::env::var_os(key).map(PathBuf::from))
    }

    /// `PROMPTOS_ARCADE_SETTINGS` wins, then the XDG config dir, then
    /// `~/.config`.
    pub fn resolve<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<PathBuf>,
    {
        if let Some(explicit) = get_env("PROMPTOS_ARCADE_SETTINGS") {
            return Self { path: explicit };
        }

        let base = get_env("XDG_CONFIG_HOME")
            .or_else(|| get_env("HOME").map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: base.join("promptos").join("arcade.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load(&self) -> ArcadeSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return ArcadeSettings::default();
        };
        match serde_json::from_slice::<ArcadeSettings>(&bytes) {
            Ok(settings) => settings.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring malformed arcade settings");
                ArcadeSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &ArcadeSettings) -> Result<(), ArcadeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}
