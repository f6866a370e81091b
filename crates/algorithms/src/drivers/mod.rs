//! Driver feature engine
//!
//! Turns weather series into the four storm indicators the shoreline model
//! uses: annual rows from hourly reanalysis for training, and one weekly row
//! from a live forecast for serving.

mod annual;
mod merge;
mod weekly;

pub use annual::{annual_features, daily_drivers};
pub use merge::merge_nearest;
pub use weekly::{daily_forecast, storm_proxies, weekly_features, ProxyDay};

use chrono::Duration;

/// Parameters shared by the annual and weekly feature builders
#[derive(Debug, Clone)]
pub struct DriverParams {
    /// Maximum time gap when pairing wave and rain observations
    pub merge_tolerance: Duration,
    /// Percentile of daily max wave height that marks a storm day
    pub storm_percentile: f64,
    /// Rolling rainfall window in days
    pub rain_window: usize,
    /// Wind speed (m/s) at or above which a forecast day is stormy
    pub wind_storm_threshold: f64,
    /// Weight of daily rainfall in the storm proxy
    pub rain_weight: f64,
    /// Half-saturation constant of the weekly storm index
    pub storm_index_scale: f64,
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            merge_tolerance: Duration::minutes(5),
            storm_percentile: 95.0,
            rain_window: 3,
            wind_storm_threshold: 10.0,
            rain_weight: 0.2,
            storm_index_scale: 5.0,
        }
    }
}
