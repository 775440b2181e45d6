//! glucowatch-types: Shared data types for the glucowatch CGM monitor.
//!
//! This crate contains pure data types (readings, series, units, colors,
//! alarm configuration) shared across all glucowatch crates. It has no
//! audio or runtime dependencies, making it suitable as a foundation layer.

pub mod alarm;
pub mod color;
pub mod reading;
pub mod units;

// Re-export commonly used types at the crate root for convenience
pub use alarm::{AlarmSoundConfig, AlarmThresholds};
pub use color::Color;
pub use reading::{clean_float_value, BloodSugar, Reading, Series, NO_VALUE};
pub use units::Units;
