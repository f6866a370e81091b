//! Weather driver series and the feature rows derived from them
//!
//! Hourly reanalysis observations feed the annual training features; a short
//! live forecast feeds the weekly serving features. Both end up as the same
//! [`DriverFeatures`] shape so one fitted model applies to either.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Names of the four driver features, in model column order
pub const FEATURE_NAMES: [&str; 4] = ["storm_days", "wave_power", "rain_3d_max", "storm_index"];

/// One hourly wave observation (significant wave height, mean wave period)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveObservation {
    pub time: NaiveDateTime,
    /// Significant height of combined wind waves and swell (m)
    pub swh: Option<f64>,
    /// Mean wave period (s)
    pub mwp: Option<f64>,
}

/// One hourly rainfall observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainObservation {
    pub time: NaiveDateTime,
    /// Total precipitation
    pub tp: Option<f64>,
}

/// Wave observation joined with the nearest rainfall observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyDriver {
    pub time: NaiveDateTime,
    pub swh: Option<f64>,
    pub mwp: Option<f64>,
    pub tp: Option<f64>,
}

/// Calendar-day aggregate of the hourly drivers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyDriver {
    pub date: NaiveDate,
    /// Daily maximum significant wave height
    pub hs_max: Option<f64>,
    /// Daily mean wave period
    pub tp_mean: Option<f64>,
    /// Daily rainfall sum (missing hours count as zero)
    pub rain_sum: f64,
}

/// The four storm indicators the shoreline model is fitted on
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DriverFeatures {
    pub storm_days: u32,
    pub wave_power: f64,
    pub rain_3d_max: f64,
    pub storm_index: f64,
}

impl DriverFeatures {
    /// Feature values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; 4] {
        [
            f64::from(self.storm_days),
            self.wave_power,
            self.rain_3d_max,
            self.storm_index,
        ]
    }
}

/// Annual driver features for one calendar year (`annual_driver_features.csv`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualDriverFeatures {
    pub year: i32,
    pub storm_days: u32,
    pub wave_power: f64,
    pub rain_3d_max: f64,
    pub storm_index: f64,
}

impl AnnualDriverFeatures {
    pub fn new(year: i32, features: DriverFeatures) -> Self {
        Self {
            year,
            storm_days: features.storm_days,
            wave_power: features.wave_power,
            rain_3d_max: features.rain_3d_max,
            storm_index: features.storm_index,
        }
    }

    pub fn features(&self) -> DriverFeatures {
        DriverFeatures {
            storm_days: self.storm_days,
            wave_power: self.wave_power,
            rain_3d_max: self.rain_3d_max,
            storm_index: self.storm_index,
        }
    }
}

/// One step of a live weather forecast (hourly or daily granularity)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastObservation {
    pub time: DateTime<Utc>,
    /// Wind speed (m/s)
    pub wind_speed: Option<f64>,
    /// Wind gust (m/s)
    pub wind_gust: Option<f64>,
    /// Rainfall (mm), zero when the provider omits it
    pub rain: f64,
}

/// Local calendar-day aggregate of a live forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub wind_max: Option<f64>,
    pub gust_max: Option<f64>,
    pub rain_sum: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order_matches_names() {
        let f = DriverFeatures {
            storm_days: 3,
            wave_power: 12.5,
            rain_3d_max: 4.0,
            storm_index: 0.7,
        };
        assert_eq!(f.to_array(), [3.0, 12.5, 4.0, 0.7]);
        assert_eq!(FEATURE_NAMES[1], "wave_power");
    }

    #[test]
    fn test_annual_roundtrip_through_features() {
        let f = DriverFeatures {
            storm_days: 18,
            wave_power: 900.0,
            rain_3d_max: 0.05,
            storm_index: 1.0,
        };
        let row = AnnualDriverFeatures::new(2012, f);
        assert_eq!(row.year, 2012);
        assert_eq!(row.features(), f);
    }
}
