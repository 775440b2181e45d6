//! Shared constants for the main screen

use std::time::Duration;

/// How often the cache is polled and the screen repainted
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How often the poll loop health check runs
pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(12 * 60);

/// Audio is unmuted this long after the snooze button was pressed,
/// whatever the user picked in the snooze dialog
pub const SNOOZE_SAFETY_WINDOW: Duration = Duration::from_secs(30);

/// Pan release speed (points per second) above which the chart is flung
pub const SWIPE_VELOCITY_THRESHOLD: f64 = 100.0;

/// Longest snooze the alarm accepts, in minutes
pub const MAX_SNOOZE_MINUTES: i64 = 24 * 60;

/// Snooze button text while no snooze is active
pub const SNOOZE_LABEL: &str = "Snooze";
