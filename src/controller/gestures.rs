//! Pan and pinch gesture bookkeeping

/// Phase of a continuous gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Began,
    Changed,
    Ended,
}

/// One pan update; translation is cumulative since the gesture began
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanEvent {
    pub phase: GesturePhase,
    pub translation_x: f64,
    /// Horizontal velocity in points per second
    pub velocity_x: f64,
}

/// One pinch update; scale is cumulative since the gesture began
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    pub phase: GesturePhase,
    pub scale: f64,
}

/// Turns cumulative pan translations into incremental deltas
#[derive(Debug, Default)]
pub struct PanTracker {
    already_dragged: f64,
}

impl PanTracker {
    pub fn reset(&mut self) {
        self.already_dragged = 0.0;
    }

    /// Delta since the previous update of this gesture
    pub fn advance(&mut self, translation_x: f64) -> f64 {
        let delta = translation_x - self.already_dragged;
        self.already_dragged = translation_x;
        delta
    }
}

/// Release velocity that should fling the chart, if fast enough
pub fn swipe_velocity(velocity_x: f64, threshold: f64) -> Option<f64> {
    if velocity_x < -threshold || velocity_x > threshold {
        Some(velocity_x)
    } else {
        None
    }
}
