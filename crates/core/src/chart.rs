//! Chart scene trait

use glucowatch_types::Series;

/// Stateful chart view showing today's and yesterday's series.
///
/// Drawing itself is up to the implementation; the controller only feeds it
/// data and forwards gestures.
pub trait ChartScene: Send {
    /// Replace the painted series (`[today, yesterday]`)
    fn paint_chart(&mut self, series: &[Series], canvas_width: u32, max_y: f64, move_to_latest: bool);

    /// Move the visible window by a horizontal delta
    fn drag_by(&mut self, delta_x: f64);

    /// Start a fling animation with the release velocity
    fn swipe(&mut self, velocity_x: f64);

    /// Apply a zoom factor; `commit` keeps it as the new base zoom
    fn scale(&mut self, factor: f64, commit: bool);

    /// Stop a running swipe animation
    fn cancel_active_animation(&mut self);
}
