//! OpenWeatherMap One Call 3.0 response models

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use shorecast_core::series::ForecastObservation;

/// Rain volume: hourly steps report `{"1h": mm}`, daily steps a bare number
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Precipitation {
    Amount(f64),
    Window {
        #[serde(rename = "1h", default)]
        one_hour: Option<f64>,
    },
}

impl Precipitation {
    /// Millimetres, zero when absent or not finite
    pub fn millimetres(&self) -> f64 {
        let mm = match *self {
            Self::Amount(v) => Some(v),
            Self::Window { one_hour } => one_hour,
        };
        mm.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

/// One hourly or daily forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStep {
    /// Unix time (UTC seconds)
    pub dt: i64,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub rain: Option<Precipitation>,
}

impl ForecastStep {
    fn observation(&self) -> Option<ForecastObservation> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(ForecastObservation {
            time: DateTime::from_timestamp(self.dt, 0)?,
            wind_speed: finite(self.wind_speed),
            wind_gust: finite(self.wind_gust),
            rain: self.rain.map_or(0.0, |r| r.millimetres()),
        })
    }
}

/// The parts of a One Call response the forecast uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OneCallResponse {
    #[serde(default)]
    pub hourly: Vec<ForecastStep>,
    #[serde(default)]
    pub daily: Vec<ForecastStep>,
}

impl OneCallResponse {
    /// Hourly then daily steps as observations; steps with an invalid time are dropped
    pub fn observations(&self) -> Vec<ForecastObservation> {
        self.hourly
            .iter()
            .chain(&self.daily)
            .filter_map(ForecastStep::observation)
            .collect()
    }
}
