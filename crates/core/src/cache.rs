//! Glucose data cache trait

use glucowatch_types::{Reading, Series};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors surfaced by a fresh load
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("The server could not be reached: {0}")]
    Unreachable(String),
    #[error("The request timed out")]
    Timeout,
    #[error("The server sent an invalid response: {0}")]
    InvalidResponse(String),
    #[error("No data available")]
    NoData,
}

/// Boxed future returned by the fresh-load operations
pub type LoadFuture<T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'static>>;

/// Holds the latest and historical glucose readings.
///
/// The `*_series`/`current_reading` getters return whatever is cached right
/// now and never block. The `load_*` operations fetch fresh data, update the
/// cache and resolve with the result.
pub trait GlucoseCache: Send + Sync {
    fn current_reading(&self) -> Reading;

    fn load_current_reading(&self) -> LoadFuture<Reading>;

    fn today_series(&self) -> Series;

    fn load_today_series(&self) -> LoadFuture<Series>;

    fn yesterday_series(&self) -> Series;

    fn load_yesterday_series(&self) -> LoadFuture<Series>;

    /// Whether cached data changed since the previous call
    fn has_changed_since_last_check(&self) -> bool;
}
