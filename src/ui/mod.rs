//! Front end pieces: color scheme, terminal view and text commands

mod colors;
mod commands;
mod terminal;

pub use colors::{ColorScheme, ThresholdColors};
pub use commands::{parse_command, spawn_stdin_reader, CommandParseError};
pub use terminal::TerminalView;
