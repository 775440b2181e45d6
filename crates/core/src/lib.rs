//! glucowatch-core: Collaborator traits for the glucowatch main screen.
//!
//! The main controller only talks to its collaborators (data cache, alarm
//! rule, sound player, chart scene, settings, companion device) through the
//! traits in this crate, so each one can be swapped or faked in tests.

pub mod alarm_rule;
pub mod cache;
pub mod chart;
pub mod constants;
pub mod device;
pub mod settings;
pub mod sound;

pub use alarm_rule::{AlarmRule, ThresholdAlarmRule};
pub use cache::{CacheError, GlucoseCache, LoadFuture};
pub use chart::ChartScene;
pub use constants::{
    MAX_SNOOZE_MINUTES, POLL_INTERVAL, SNOOZE_LABEL, SNOOZE_SAFETY_WINDOW, SWIPE_VELOCITY_THRESHOLD,
    WATCHDOG_INTERVAL,
};
pub use device::{CompanionSync, DisplayControl};
pub use settings::{GuiState, GuiStateRepository, MemoryGuiState};
pub use sound::{SilentSound, SoundPlayer};

// Re-export types used in trait signatures for convenience
pub use glucowatch_types::{BloodSugar, Reading, Series, Units};
