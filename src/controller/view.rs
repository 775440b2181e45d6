//! View trait the controller paints into

use super::Screen;

/// Front end showing the main screen
pub trait MainView: Send {
    /// Show the current screen state
    fn render(&mut self, screen: &Screen);

    /// Modal informational message
    fn show_message(&mut self, title: &str, message: &str);

    /// Ask the user how long to snooze; the answer comes back as
    /// [`UiCommand::SnoozeFor`](super::UiCommand::SnoozeFor)
    fn show_snooze_picker(&mut self);
}
