//! Text commands read from the terminal
//!
//! Each input line maps to one [`UiCommand`]:
//!
//! ```text
//! snooze                      toggle snooze
//! snooze-for <minutes>        answer the snooze picker
//! lock on|off                 screen lock switch
//! touch                       finger down on the chart
//! pan <phase> <dx> [<vx>]     pan gesture, phase is began|changed|ended
//! pinch <phase> <scale>       pinch gesture
//! fg | bg                     app moved to foreground / background
//! repaint                     force a chart repaint
//! quit
//! ```

use log::{debug, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::controller::{GesturePhase, PanEvent, PinchEvent, UiCommand};

#[derive(Debug, Error, PartialEq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Invalid argument '{value}' for {name}")]
    InvalidArgument { name: &'static str, value: String },
}

fn invalid(name: &'static str, value: &str) -> CommandParseError {
    CommandParseError::InvalidArgument {
        name,
        value: value.to_string(),
    }
}

fn required<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<&'a str, CommandParseError> {
    args.next().ok_or(CommandParseError::MissingArgument(name))
}

fn number(value: &str, name: &'static str) -> Result<f64, CommandParseError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, value))
}

fn phase(value: &str) -> Result<GesturePhase, CommandParseError> {
    match value {
        "began" | "begin" | "b" => Ok(GesturePhase::Began),
        "changed" | "change" | "c" => Ok(GesturePhase::Changed),
        "ended" | "end" | "e" => Ok(GesturePhase::Ended),
        other => Err(invalid("phase", other)),
    }
}

/// Parse one input line
pub fn parse_command(line: &str) -> Result<UiCommand, CommandParseError> {
    let mut args = line.split_whitespace();
    let name = args.next().ok_or(CommandParseError::Empty)?;

    let command = match name.to_ascii_lowercase().as_str() {
        "snooze" => UiCommand::ToggleSnooze,
        "snooze-for" => {
            let value = required(&mut args, "minutes")?;
            let minutes = value.parse::<i64>().map_err(|_| invalid("minutes", value))?;
            UiCommand::SnoozeFor(minutes)
        }
        "lock" => match required(&mut args, "on|off")? {
            "on" => UiCommand::SetScreenlock(true),
            "off" => UiCommand::SetScreenlock(false),
            other => return Err(invalid("lock", other)),
        },
        "touch" => UiCommand::TouchDown,
        "pan" => {
            let phase = phase(required(&mut args, "phase")?)?;
            let translation_x = number(required(&mut args, "translation")?, "translation")?;
            let velocity_x = match args.next() {
                Some(value) => number(value, "velocity")?,
                None => 0.0,
            };
            UiCommand::Pan(PanEvent {
                phase,
                translation_x,
                velocity_x,
            })
        }
        "pinch" => {
            let phase = phase(required(&mut args, "phase")?)?;
            let scale = number(required(&mut args, "scale")?, "scale")?;
            UiCommand::Pinch(PinchEvent { phase, scale })
        }
        "fg" | "foreground" => UiCommand::Foreground(true),
        "bg" | "background" => UiCommand::Foreground(false),
        "repaint" => UiCommand::RepaintChart,
        "quit" | "exit" | "q" => UiCommand::Quit,
        _ => return Err(CommandParseError::Unknown(name.to_string())),
    };

    Ok(command)
}

/// Forward commands typed on stdin until EOF or the receiver goes away
pub fn spawn_stdin_reader(tx: mpsc::Sender<UiCommand>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            };

            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(command) => {
                    if tx.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    })
}
