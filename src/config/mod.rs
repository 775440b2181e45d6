//! Configuration management

mod gui_state;
mod settings;

pub use gui_state::JsonGuiStateRepository;
pub use settings::{AppConfig, ChartConfig, PollingConfig};
