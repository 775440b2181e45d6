//! Line-oriented terminal front end

use std::io::Write;

use crate::controller::{Label, MainView, Screen};

const RESET: &str = "\x1b[0m";

/// [`MainView`] printing the screen to stdout whenever it changes
pub struct TerminalView {
    use_color: bool,
    last_frame: Option<String>,
}

impl TerminalView {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            last_frame: None,
        }
    }

    fn paint(&self, label: &Label) -> String {
        if self.use_color {
            format!("{}{}{}", label.color.ansi_fg(), label.text, RESET)
        } else {
            label.text.clone()
        }
    }

    /// Text rendition of the screen, one block per frame
    pub fn format_screen(&self, screen: &Screen) -> String {
        let mut lines = vec![format!(
            "[{}]  {} {} {}   updated {}",
            screen.clock.text,
            self.paint(&screen.bg),
            self.paint(&screen.delta),
            self.paint(&screen.delta_arrow),
            self.paint(&screen.last_update),
        )];

        let mut status = format!("battery {}", screen.battery.text);
        if !screen.iob.text.is_empty() {
            status.push_str(&format!("  IOB {}", screen.iob.text));
        }
        if screen.raw_panel.visible {
            status.push_str(&format!(
                "  raw {} ({})",
                screen.raw_panel.rawbg, screen.raw_panel.noise
            ));
        }
        lines.push(status);

        lines.push(format!(
            "[{}]  screen lock {}",
            screen.snooze_button,
            if screen.screenlock_switch { "on" } else { "off" }
        ));

        if screen.error_banner.visible {
            let banner = Label {
                text: screen.error_banner.text.clone(),
                color: screen.error_banner.color,
            };
            lines.push(self.paint(&banner));
        }

        lines.join("\n")
    }

    fn print(text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", text).and_then(|_| stdout.flush()) {
            log::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl MainView for TerminalView {
    fn render(&mut self, screen: &Screen) {
        let frame = self.format_screen(screen);
        if self.last_frame.as_deref() == Some(frame.as_str()) {
            return;
        }
        Self::print(&format!("\n{}", frame));
        self.last_frame = Some(frame);
    }

    fn show_message(&mut self, title: &str, message: &str) {
        Self::print(&format!("\n== {} ==\n{}", title, message));
    }

    fn show_snooze_picker(&mut self) {
        Self::print("Snooze for how long? Answer with: snooze-for <minutes>");
    }
}
