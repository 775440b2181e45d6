//! Chart scene implementations

mod viewport;

pub use viewport::ChartViewport;
