//! glucowatch: main screen of a continuous glucose monitor viewer
//!
//! The [`controller::MainController`] polls a glucose cache, raises alarms
//! and keeps a screen model in sync. Front ends render that model and feed
//! user input back as [`controller::UiCommand`]s.

pub mod chart;
pub mod config;
pub mod controller;
pub mod device;
pub mod sources;
pub mod ui;

pub use config::AppConfig;
pub use controller::{ControllerConfig, MainController, Services, UiCommand};
