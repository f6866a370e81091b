//! Weekly storm proxies from a live multi-day forecast

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use shorecast_core::series::{DriverFeatures, ForecastDay, ForecastObservation};
use std::collections::BTreeMap;

use super::DriverParams;
use crate::statistics::rolling_sum;

/// One forecast day with its storm severity score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProxyDay {
    #[serde(flatten)]
    pub day: ForecastDay,
    /// Squared excess of max wind over the storm threshold
    pub storm_component: f64,
    /// `storm_component + rain_weight * rain_sum`
    pub storm_proxy: f64,
}

fn max_opt(acc: Option<f64>, v: Option<f64>) -> Option<f64> {
    match (acc, v) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Group forecast steps by local calendar date.
///
/// Keeps at most `horizon` dates on or after `today`, in date order.
pub fn daily_forecast(
    observations: &[ForecastObservation],
    offset: FixedOffset,
    today: NaiveDate,
    horizon: usize,
) -> Vec<ForecastDay> {
    let mut days: BTreeMap<NaiveDate, ForecastDay> = BTreeMap::new();
    for obs in observations {
        let date = obs.time.with_timezone(&offset).date_naive();
        let day = days.entry(date).or_insert(ForecastDay {
            date,
            wind_max: None,
            gust_max: None,
            rain_sum: 0.0,
        });
        day.wind_max = max_opt(day.wind_max, obs.wind_speed);
        day.gust_max = max_opt(day.gust_max, obs.wind_gust);
        day.rain_sum += obs.rain;
    }

    days.into_values()
        .filter(|d| d.date >= today)
        .take(horizon)
        .collect()
}

/// Score each forecast day's storm severity
pub fn storm_proxies(days: &[ForecastDay], params: &DriverParams) -> Vec<ProxyDay> {
    days.iter()
        .map(|&day| {
            let excess = (day.wind_max.unwrap_or(0.0) - params.wind_storm_threshold).max(0.0);
            let storm_component = excess * excess;
            ProxyDay {
                day,
                storm_component,
                storm_proxy: storm_component + params.rain_weight * day.rain_sum,
            }
        })
        .collect()
}

/// Collapse a forecast window into one feature row shaped like the annual ones
pub fn weekly_features(proxies: &[ProxyDay], params: &DriverParams) -> DriverFeatures {
    let wave_power: f64 = proxies.iter().map(|p| p.storm_proxy).sum();
    let storm_days = proxies
        .iter()
        .filter(|p| p.day.wind_max.is_some_and(|w| w >= params.wind_storm_threshold))
        .count() as u32;

    let rain: Vec<f64> = proxies.iter().map(|p| p.day.rain_sum).collect();
    let rain_3d_max = rolling_sum(&rain, params.rain_window)
        .into_iter()
        .reduce(f64::max)
        .unwrap_or(0.0);

    DriverFeatures {
        storm_days,
        wave_power,
        rain_3d_max,
        storm_index: wave_power / (wave_power + params.storm_index_scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn obs(day: u32, hour: u32, wind: f64, rain: f64) -> ForecastObservation {
        ForecastObservation {
            time: Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap(),
            wind_speed: Some(wind),
            wind_gust: Some(wind + 3.0),
            rain,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_daily_forecast_uses_local_dates() {
        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        // 20:00 UTC on the 1st is 06:00 on the 2nd in UTC+10
        let days = daily_forecast(
            &[obs(1, 10, 5.0, 1.0), obs(1, 20, 12.0, 2.0), obs(2, 1, 8.0, 0.5)],
            offset,
            date(1),
            7,
        );
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[1].date, date(2));
        assert_eq!(days[1].wind_max, Some(12.0));
        assert_eq!(days[1].gust_max, Some(15.0));
        assert_relative_eq!(days[1].rain_sum, 2.5);
    }

    #[test]
    fn test_daily_forecast_drops_past_and_caps_horizon() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let observations: Vec<_> = (1..=10).map(|d| obs(d, 12, 5.0, 0.0)).collect();
        let days = daily_forecast(&observations, offset, date(3), 7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].date, date(3));
        assert_eq!(days[6].date, date(9));
    }

    #[test]
    fn test_weekly_features() {
        let params = DriverParams::default();
        let days = [
            ForecastDay { date: date(1), wind_max: Some(14.0), gust_max: None, rain_sum: 5.0 },
            ForecastDay { date: date(2), wind_max: Some(10.0), gust_max: None, rain_sum: 0.0 },
            ForecastDay { date: date(3), wind_max: Some(4.0), gust_max: None, rain_sum: 2.0 },
            ForecastDay { date: date(4), wind_max: None, gust_max: None, rain_sum: 6.0 },
        ];
        let proxies = storm_proxies(&days, &params);
        assert_relative_eq!(proxies[0].storm_component, 16.0);
        assert_relative_eq!(proxies[0].storm_proxy, 17.0);
        assert_relative_eq!(proxies[1].storm_proxy, 0.0);
        assert_relative_eq!(proxies[3].storm_proxy, 1.2, epsilon = 1e-12);

        let f = weekly_features(&proxies, &params);
        assert_eq!(f.storm_days, 2);
        assert_relative_eq!(f.wave_power, 17.0 + 0.4 + 1.2, epsilon = 1e-12);
        assert_relative_eq!(f.rain_3d_max, 8.0);
        assert_relative_eq!(f.storm_index, f.wave_power / (f.wave_power + 5.0));
    }
}
