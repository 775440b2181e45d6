//! Persisted GUI state repository

use glucowatch_types::Units;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// User-facing settings and small UI flags that survive restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiState {
    /// Keep the screen awake while the app runs
    #[serde(default)]
    pub screenlock_enabled: bool,
    /// The screen-lock explanation has been shown once
    #[serde(default)]
    pub screenlock_message_shown: bool,
    /// Show the raw/noise panel when raw values exist
    #[serde(default)]
    pub show_raw_bg: bool,
    /// Upper bound of the chart Y axis, mg/dL
    #[serde(default = "default_max_bg")]
    pub max_bg_displayed: f64,
    #[serde(default)]
    pub units: Units,
}

fn default_max_bg() -> f64 {
    250.0
}

impl Default for GuiState {
    fn default() -> Self {
        Self {
            screenlock_enabled: false,
            screenlock_message_shown: false,
            show_raw_bg: false,
            max_bg_displayed: default_max_bg(),
            units: Units::default(),
        }
    }
}

/// Read/write access to [`GuiState`].
///
/// Writes are infallible for callers; implementations log persistence errors.
pub trait GuiStateRepository: Send + Sync {
    fn load_screenlock_state(&self) -> bool;
    fn store_screenlock_state(&self, enabled: bool);
    fn screenlock_message_shown(&self) -> bool;
    fn mark_screenlock_message_shown(&self);
    fn show_raw_bg(&self) -> bool;
    fn max_bg_displayed(&self) -> f64;
    fn units(&self) -> Units;
}

/// Repository keeping state in memory only
#[derive(Debug, Default)]
pub struct MemoryGuiState {
    state: Mutex<GuiState>,
}

impl MemoryGuiState {
    pub fn new(state: GuiState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn snapshot(&self) -> GuiState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update(&self, update_fn: impl FnOnce(&mut GuiState)) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        update_fn(&mut state);
    }
}

impl GuiStateRepository for MemoryGuiState {
    fn load_screenlock_state(&self) -> bool {
        self.snapshot().screenlock_enabled
    }

    fn store_screenlock_state(&self, enabled: bool) {
        self.update(|s| s.screenlock_enabled = enabled);
    }

    fn screenlock_message_shown(&self) -> bool {
        self.snapshot().screenlock_message_shown
    }

    fn mark_screenlock_message_shown(&self) {
        self.update(|s| s.screenlock_message_shown = true);
    }

    fn show_raw_bg(&self) -> bool {
        self.snapshot().show_raw_bg
    }

    fn max_bg_displayed(&self) -> f64 {
        self.snapshot().max_bg_displayed
    }

    fn units(&self) -> Units {
        self.snapshot().units
    }
}
