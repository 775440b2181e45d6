//! Application configuration

use anyhow::{Context, Result};
use glucowatch_types::{AlarmSoundConfig, AlarmThresholds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::ControllerConfig;
use crate::sources::SimulationConfig;

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    /// Alarm limits
    #[serde(default)]
    pub alarm: AlarmThresholds,
    #[serde(default)]
    pub sound: AlarmSoundConfig,
    /// Synthetic data source parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            polling: PollingConfig::default(),
            chart: ChartConfig::default(),
            alarm: AlarmThresholds::default(),
            sound: AlarmSoundConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Directory holding config and persisted GUI state
    pub fn config_dir() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "github.glucowatch", "glucowatch")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().to_path_buf())
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Timing and gesture settings for the main controller
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            poll_interval: Duration::from_secs(self.polling.interval_secs.max(1)),
            watchdog_interval: Duration::from_secs(self.polling.watchdog_secs.max(1)),
            snooze_safety_window: Duration::from_secs(self.polling.snooze_safety_secs),
            swipe_velocity_threshold: self.chart.swipe_velocity_threshold,
            canvas_width: self.chart.canvas_width,
            max_ticks: None,
        }
    }
}

/// Poll loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Health check period of the poll loop
    #[serde(default = "default_watchdog_secs")]
    pub watchdog_secs: u64,
    #[serde(default = "default_snooze_safety_secs")]
    pub snooze_safety_secs: u64,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_watchdog_secs() -> u64 {
    12 * 60
}

fn default_snooze_safety_secs() -> u64 {
    30
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            watchdog_secs: default_watchdog_secs(),
            snooze_safety_secs: default_snooze_safety_secs(),
        }
    }
}

/// Chart view settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Widest canvas the display can hold, in points
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    /// Width of the on-screen chart window, in points
    #[serde(default = "default_view_width")]
    pub view_width: f64,
    #[serde(default = "default_swipe_velocity_threshold")]
    pub swipe_velocity_threshold: f64,
}

fn default_canvas_width() -> u32 {
    1024
}

fn default_view_width() -> f64 {
    320.0
}

fn default_swipe_velocity_threshold() -> f64 {
    glucowatch_core::SWIPE_VELOCITY_THRESHOLD
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            view_width: default_view_width(),
            swipe_velocity_threshold: default_swipe_velocity_threshold(),
        }
    }
}
