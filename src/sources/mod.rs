//! Glucose data cache implementations

mod simulated;

pub use simulated::{SimulatedCache, SimulationConfig};
