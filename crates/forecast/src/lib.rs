//! # Shorecast Forecast
//!
//! Seven-day, per-transect shoreline change forecasts.
//!
//! A live weather forecast for a location is reduced to the same four storm
//! indicators the model was trained on, turned into a weekly shoreline change
//! estimate, rescaled to each transect's own historical trend and spread over
//! the forecast days by daily storm severity. Upstream responses and finished
//! forecasts are kept in TTL caches keyed by rounded location.

pub mod cache;
pub mod client;
pub mod engine;
pub mod error;
pub mod index;
pub mod owm;
pub mod summary;

pub use cache::{Clock, LocationKey, ManualClock, SystemClock, TtlCache};
pub use client::{OpenWeatherClient, WeatherProvider};
pub use engine::{
    distribute_weekly, scale_factor, CacheStats, ForecastConfig, ForecastEngine, ForecastMeta,
    ForecastRecord, ForecastResponse, Health,
};
pub use error::{ForecastError, Result};
pub use index::{NearestTransect, TransectIndex, TransectRecord};
pub use owm::OneCallResponse;
pub use summary::{summarize, DailyTotal, ForecastSummary, TransectWeek, DEFAULT_SUMMARY_K};

/// Finite values only; NaN and infinities become missing
pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// [`finite`] over an optional value
pub(crate) fn finite_opt(v: Option<f64>) -> Option<f64> {
    v.and_then(finite)
}
