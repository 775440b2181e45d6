//! Platform collaborators for a desktop terminal session

use glucowatch_core::{CompanionSync, DisplayControl, Reading};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};

/// Companion device sync that only logs what it would send
#[derive(Debug, Default)]
pub struct LogCompanionSync;

impl CompanionSync for LogCompanionSync {
    fn push_latest(&self, reading: &Reading) {
        info!(
            "Companion sync: {} {} {} ({})",
            reading.sgv, reading.delta_string, reading.delta_arrow, reading.battery
        );
    }
}

/// Remembers the idle-timer flag; a terminal has no screen saver to inhibit
#[derive(Debug, Default)]
pub struct LogDisplayControl {
    idle_timer_disabled: AtomicBool,
}

impl DisplayControl for LogDisplayControl {
    fn set_idle_timer_disabled(&self, disabled: bool) {
        let previous = self.idle_timer_disabled.swap(disabled, Ordering::SeqCst);
        if previous != disabled {
            info!(
                "Screen lock {}",
                if disabled { "disabled" } else { "enabled" }
            );
        }
    }

    fn is_idle_timer_disabled(&self) -> bool {
        self.idle_timer_disabled.load(Ordering::SeqCst)
    }
}
