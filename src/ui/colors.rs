//! Value dependent label colors

use chrono::{DateTime, Utc};
use glucowatch_types::{AlarmThresholds, Color};

/// Maps displayed values to label colors
pub trait ColorScheme: Send + Sync {
    /// Color of the glucose value, `mgdl == 0` means unknown
    fn bg_color(&self, mgdl: f64) -> Color;

    /// Color of the delta and trend arrow
    fn delta_color(&self, delta: f64) -> Color;

    /// Color of the "last update" label
    fn time_color(&self, time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Color;
}

/// Yellow outside the alarm range, red far outside it or when data is old
#[derive(Debug, Clone)]
pub struct ThresholdColors {
    thresholds: AlarmThresholds,
}

impl ThresholdColors {
    /// Distance beyond a limit at which a value turns red, mg/dL
    const URGENT_MARGIN: f64 = 25.0;

    pub fn new(thresholds: AlarmThresholds) -> Self {
        Self { thresholds }
    }
}

impl ColorScheme for ThresholdColors {
    fn bg_color(&self, mgdl: f64) -> Color {
        if mgdl <= 0.0 {
            return Color::WHITE;
        }
        let low = self.thresholds.low;
        let high = self.thresholds.high;
        if mgdl < low - Self::URGENT_MARGIN || mgdl > high + Self::URGENT_MARGIN {
            Color::RED
        } else if self.thresholds.is_out_of_range(mgdl) {
            Color::YELLOW
        } else {
            Color::WHITE
        }
    }

    fn delta_color(&self, delta: f64) -> Color {
        match delta.abs() {
            d if d >= 10.0 => Color::RED,
            d if d >= 5.0 => Color::YELLOW,
            _ => Color::WHITE,
        }
    }

    fn time_color(&self, time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Color {
        let Some(time) = time else {
            return Color::GRAY;
        };
        match (now - time).num_minutes() {
            m if m >= self.thresholds.stale_minutes.max(1) => Color::RED,
            m if m >= 10 => Color::YELLOW,
            _ => Color::WHITE,
        }
    }
}
