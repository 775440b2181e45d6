//! Device-side collaborators: companion sync and display control

use glucowatch_types::Reading;

/// Pushes the latest reading to a paired device (e.g. a watch).
///
/// Fire-and-forget: implementations must not block the caller.
pub trait CompanionSync: Send + Sync {
    fn push_latest(&self, reading: &Reading);
}

/// Host display control
pub trait DisplayControl: Send + Sync {
    /// `true` keeps the screen awake
    fn set_idle_timer_disabled(&self, disabled: bool);

    fn is_idle_timer_disabled(&self) -> bool;
}
