//! Glucose alarm and alarm sound configuration types

use serde::{Deserialize, Serialize};

/// Configuration for the alarm sound
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmSoundConfig {
    /// Whether sound is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Custom sound file path (None = use system alert)
    #[serde(default)]
    pub custom_sound_path: Option<String>,

    /// Whether to loop the sound until stopped
    #[serde(default = "default_true")]
    pub loop_sound: bool,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f32 {
    0.8
}

impl Default for AlarmSoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_sound_path: None,
            loop_sound: true,
            volume: 0.8,
        }
    }
}

/// Limits the alarm rule checks readings against, all in mg/dL
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    /// Alarm when the newest reading is older than this; 0 disables the check
    #[serde(default = "default_stale_minutes")]
    pub stale_minutes: i64,
}

fn default_low() -> f64 {
    80.0
}

fn default_high() -> f64 {
    180.0
}

fn default_stale_minutes() -> i64 {
    15
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            low: default_low(),
            high: default_high(),
            stale_minutes: default_stale_minutes(),
        }
    }
}

impl AlarmThresholds {
    /// Whether a mg/dL value lies outside the configured range
    pub fn is_out_of_range(&self, mgdl: f64) -> bool {
        mgdl < self.low || mgdl > self.high
    }
}
