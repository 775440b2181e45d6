//! Chart viewport state
//!
//! Tracks which part of the day is visible and how far the chart is zoomed.
//! The canvas spans one day horizontally; the pinch zoom scales the Y axis by
//! changing the highest glucose value shown.

use chrono::{DateTime, Duration, Utc};
use glucowatch_core::{ChartScene, Series};

/// Minutes covered by the full canvas width
const CANVAS_MINUTES: f64 = 24.0 * 60.0;

/// How long a fling keeps moving the chart, in seconds of release velocity
const FLING_SECONDS: f64 = 0.25;

const MIN_SCALE: f64 = 0.25;
const MAX_SCALE: f64 = 8.0;

/// [`ChartScene`] holding the painted series and the visible window.
///
/// There are no animation frames: a swipe applies its whole fling distance
/// at once and stays flagged as active until cancelled or repainted.
#[derive(Debug, Clone)]
pub struct ChartViewport {
    series: Vec<Series>,
    /// Width of the on-screen chart, in points
    view_width: f64,
    canvas_width: f64,
    max_y: f64,
    /// Points scrolled back from the newest value
    offset_x: f64,
    scale: f64,
    live_scale: f64,
    swipe_active: bool,
}

impl ChartViewport {
    pub fn new(view_width: f64) -> Self {
        Self {
            series: Vec::new(),
            view_width: view_width.max(1.0),
            canvas_width: 1024.0,
            max_y: 250.0,
            offset_x: 0.0,
            scale: 1.0,
            live_scale: 1.0,
            swipe_active: false,
        }
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn offset_x(&self) -> f64 {
        self.offset_x
    }

    /// Committed zoom level
    pub fn scale_level(&self) -> f64 {
        self.scale
    }

    pub fn is_swipe_active(&self) -> bool {
        self.swipe_active
    }

    /// Highest glucose value on the Y axis under the current zoom
    pub fn visible_max_y(&self) -> f64 {
        self.max_y / self.live_scale
    }

    fn points_per_minute(&self) -> f64 {
        self.canvas_width / CANVAS_MINUTES
    }

    fn max_offset(&self) -> f64 {
        (self.canvas_width - self.view_width).max(0.0)
    }

    fn scroll_to(&mut self, offset: f64) {
        self.offset_x = offset.clamp(0.0, self.max_offset());
    }

    /// Time range currently on screen, anchored at the newest painted point
    pub fn visible_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let latest = self
            .series
            .iter()
            .filter_map(|s| s.last())
            .map(|p| p.timestamp)
            .max()?;

        let ppm = self.points_per_minute();
        let end = latest - Duration::seconds((self.offset_x / ppm * 60.0) as i64);
        let start = end - Duration::seconds((self.view_width / ppm * 60.0) as i64);
        Some((start, end))
    }
}

impl ChartScene for ChartViewport {
    fn paint_chart(&mut self, series: &[Series], canvas_width: u32, max_y: f64, move_to_latest: bool) {
        self.series = series.to_vec();
        self.canvas_width = (canvas_width as f64).max(self.view_width);
        self.max_y = max_y;
        self.swipe_active = false;

        if move_to_latest {
            self.offset_x = 0.0;
        } else {
            self.scroll_to(self.offset_x);
        }

        log::trace!(
            "Chart painted: {} series, {} points, visible {:?}",
            self.series.len(),
            self.series.iter().map(Vec::len).sum::<usize>(),
            self.visible_range()
        );
    }

    fn drag_by(&mut self, delta_x: f64) {
        // Dragging to the right reveals older values
        self.scroll_to(self.offset_x + delta_x);
    }

    fn swipe(&mut self, velocity_x: f64) {
        self.swipe_active = true;
        self.scroll_to(self.offset_x + velocity_x * FLING_SECONDS);
    }

    fn scale(&mut self, factor: f64, commit: bool) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.live_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if commit {
            self.scale = self.live_scale;
            log::debug!("Chart zoom committed at {:.2}", self.scale);
        }
    }

    fn cancel_active_animation(&mut self) {
        self.swipe_active = false;
    }
}
