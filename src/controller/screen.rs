//! Painted state of the main screen

use chrono::{DateTime, Local, Utc};
use glucowatch_core::{Reading, Units, SNOOZE_LABEL};
use glucowatch_types::{clean_float_value, Color, NO_VALUE};

use crate::ui::ColorScheme;

/// A text element with its color
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub color: Color,
}

impl Label {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            color: Color::WHITE,
        }
    }
}

/// Sensor diagnostics shown next to the glucose value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPanel {
    pub visible: bool,
    pub noise: String,
    pub rawbg: String,
}

/// Connection error strip above the chart
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBanner {
    pub visible: bool,
    pub text: String,
    pub color: Color,
}

impl Default for ErrorBanner {
    fn default() -> Self {
        Self {
            visible: false,
            text: String::new(),
            color: Color::RED,
        }
    }
}

/// Everything the main screen shows, apart from the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub bg: Label,
    pub delta: Label,
    pub delta_arrow: Label,
    pub clock: Label,
    pub last_update: Label,
    pub battery: Label,
    pub iob: Label,
    pub snooze_button: String,
    pub raw_panel: RawPanel,
    pub error_banner: ErrorBanner,
    pub screenlock_switch: bool,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            bg: Label::new(NO_VALUE),
            delta: Label::new(""),
            delta_arrow: Label::new(""),
            clock: Label::new(""),
            last_update: Label::new(NO_VALUE),
            battery: Label::new(NO_VALUE),
            iob: Label::new(""),
            snooze_button: SNOOZE_LABEL.to_string(),
            raw_panel: RawPanel::default(),
            error_banner: ErrorBanner::default(),
            screenlock_switch: false,
        }
    }
}

/// The raw panel is only worth showing for a usable raw value
pub fn raw_panel_visible(reading: &Reading, show_raw_bg: bool, units: Units) -> bool {
    show_raw_bg && units.to_mgdl(&reading.rawbg) > 0.0
}

/// Snooze button text for the given snooze state
pub fn snooze_button_text(snoozed: bool, remaining_minutes: i64) -> String {
    if snoozed {
        format!("Snoozed for {}min", remaining_minutes)
    } else {
        SNOOZE_LABEL.to_string()
    }
}

impl Screen {
    /// Paint all fields derived from a reading
    pub fn paint_reading(
        &mut self,
        reading: &Reading,
        colors: &dyn ColorScheme,
        show_raw_bg: bool,
        units: Units,
        now: DateTime<Utc>,
    ) {
        self.bg.text = reading.sgv.clone();
        self.bg.color = colors.bg_color(reading.sgv_value);

        let delta_color = colors.delta_color(reading.delta);
        self.delta.text = clean_float_value(&reading.delta_string);
        self.delta.color = delta_color;
        self.delta_arrow.text = reading.delta_arrow.clone();
        self.delta_arrow.color = delta_color;

        self.last_update.text = reading.time_string(now);
        self.last_update.color = colors.time_color(reading.time, now);

        self.battery.text = reading.battery.clone();
        self.iob.text = reading.iob.clone();

        self.raw_panel.visible = raw_panel_visible(reading, show_raw_bg, units);
        self.raw_panel.noise = reading.noise.clone();
        self.raw_panel.rawbg = reading.rawbg.clone();
    }

    /// Paint the wall clock, e.g. "9:05 PM"
    pub fn paint_clock(&mut self, now: DateTime<Local>) {
        self.clock.text = now.format("%-I:%M %p").to_string();
    }

    pub fn show_error(&mut self, message: &str) {
        self.error_banner.visible = true;
        self.error_banner.text = format!("❌ {}", message);
        self.error_banner.color = Color::RED;
    }

    pub fn hide_error(&mut self) {
        self.error_banner.visible = false;
    }
}
