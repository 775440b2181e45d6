//! Glucose readings and daily series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display text used when no value is known
pub const NO_VALUE: &str = "---";

/// A single glucose measurement with trend and device metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Glucose value as displayed (already in the user's units)
    pub sgv: String,
    /// Glucose value in mg/dL, `0.0` when unknown
    #[serde(default)]
    pub sgv_value: f64,
    /// Change since the previous reading
    #[serde(default)]
    pub delta: f64,
    pub delta_string: String,
    /// Trend arrow glyph, e.g. "↗"
    pub delta_arrow: String,
    /// When the sensor took the reading
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Uploader/device battery, e.g. "87%"
    pub battery: String,
    /// Insulin on board, e.g. "1.2U"
    pub iob: String,
    /// Raw (uncalibrated) sensor glucose
    pub rawbg: String,
    pub noise: String,
}

impl Reading {
    /// Reading shown before any data has been received
    pub fn placeholder() -> Self {
        Self {
            sgv: NO_VALUE.to_string(),
            sgv_value: 0.0,
            delta: 0.0,
            delta_string: "0".to_string(),
            delta_arrow: "-".to_string(),
            time: None,
            battery: NO_VALUE.to_string(),
            iob: String::new(),
            rawbg: String::new(),
            noise: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.sgv == NO_VALUE || self.time.is_none()
    }

    /// Whole minutes between the reading and `now`
    pub fn age_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.time.map(|t| (now - t).num_minutes().max(0))
    }

    /// Human readable age, e.g. "5min" or "---" when unknown
    pub fn time_string(&self, now: DateTime<Utc>) -> String {
        match self.age_minutes(now) {
            Some(0) => "now".to_string(),
            Some(minutes) if minutes < 60 => format!("{}min", minutes),
            Some(minutes) => format!("{}h {}min", minutes / 60, minutes % 60),
            None => NO_VALUE.to_string(),
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// One point of a glucose chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodSugar {
    /// Glucose in mg/dL
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl BloodSugar {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }
}

/// Time-ordered readings of one calendar day
pub type Series = Vec<BloodSugar>;

/// Strip a redundant trailing ".0" from a formatted float ("+5.0" -> "+5")
pub fn clean_float_value(value: &str) -> String {
    value
        .strip_suffix(".0")
        .unwrap_or(value)
        .to_string()
}
