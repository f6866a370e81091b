//! Annual storm indicators from hourly reanalysis drivers

use chrono::{Datelike, NaiveDate};
use shorecast_core::series::{AnnualDriverFeatures, DailyDriver, DriverFeatures, HourlyDriver};
use std::collections::BTreeMap;

use super::DriverParams;
use crate::statistics::{percentile, rolling_sum};

const NORMALIZE_EPS: f64 = 1e-6;
const STORM_DAYS_WEIGHT: f64 = 0.6;
const WAVE_POWER_WEIGHT: f64 = 0.4;

#[derive(Default)]
struct DayAccumulator {
    hs_max: Option<f64>,
    period_sum: f64,
    period_count: usize,
    rain_sum: f64,
}

/// Aggregate hourly drivers to calendar days, in date order.
///
/// Missing hourly values are skipped; a day without any wave height keeps
/// `hs_max` empty, a day without rain sums to zero.
pub fn daily_drivers(hourly: &[HourlyDriver]) -> Vec<DailyDriver> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for h in hourly {
        let acc = days.entry(h.time.date()).or_default();
        if let Some(swh) = h.swh {
            acc.hs_max = Some(acc.hs_max.map_or(swh, |m| m.max(swh)));
        }
        if let Some(mwp) = h.mwp {
            acc.period_sum += mwp;
            acc.period_count += 1;
        }
        if let Some(tp) = h.tp {
            acc.rain_sum += tp;
        }
    }

    days.into_iter()
        .map(|(date, acc)| DailyDriver {
            date,
            hs_max: acc.hs_max,
            tp_mean: (acc.period_count > 0).then(|| acc.period_sum / acc.period_count as f64),
            rain_sum: acc.rain_sum,
        })
        .collect()
}

/// Annual storm indicators, one row per calendar year present in `hourly`.
///
/// A storm day is a day whose max wave height reaches that year's
/// `storm_percentile` of daily maxima. The storm index blends the storm-day
/// count and wave power, each normalised by its maximum across all years.
pub fn annual_features(hourly: &[HourlyDriver], params: &DriverParams) -> Vec<AnnualDriverFeatures> {
    let mut by_year: BTreeMap<i32, Vec<DailyDriver>> = BTreeMap::new();
    for day in daily_drivers(hourly) {
        by_year.entry(day.date.year()).or_default().push(day);
    }

    let mut rows: Vec<AnnualDriverFeatures> = by_year
        .into_iter()
        .map(|(year, days)| {
            let heights: Vec<f64> = days.iter().filter_map(|d| d.hs_max).collect();
            let storm_threshold = percentile(&heights, params.storm_percentile);

            let storm_days = match storm_threshold {
                Some(thr) => heights.iter().filter(|&&h| h >= thr).count() as u32,
                None => 0,
            };
            let wave_power: f64 = heights.iter().map(|h| h * h).sum();

            let rain: Vec<f64> = days.iter().map(|d| d.rain_sum).collect();
            let rain_3d_max = rolling_sum(&rain, params.rain_window)
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max);

            AnnualDriverFeatures::new(
                year,
                DriverFeatures {
                    storm_days,
                    wave_power,
                    rain_3d_max,
                    storm_index: 0.0,
                },
            )
        })
        .collect();

    let max_storm_days = rows.iter().map(|r| r.storm_days).max().unwrap_or(0) as f64;
    let max_wave_power = rows.iter().map(|r| r.wave_power).fold(0.0, f64::max);
    for row in &mut rows {
        row.storm_index = STORM_DAYS_WEIGHT * (row.storm_days as f64 / (max_storm_days + NORMALIZE_EPS))
            + WAVE_POWER_WEIGHT * (row.wave_power / (max_wave_power + NORMALIZE_EPS));
    }

    tracing::debug!(years = rows.len(), "annual driver features");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn hour(time: NaiveDateTime, swh: f64, tp: f64) -> HourlyDriver {
        HourlyDriver { time, swh: Some(swh), mwp: Some(8.0), tp: Some(tp) }
    }

    #[test]
    fn test_daily_aggregation() {
        let hourly = [
            hour(at(2010, 1, 1, 0), 1.0, 0.5),
            hour(at(2010, 1, 1, 12), 2.5, 0.25),
            HourlyDriver { time: at(2010, 1, 2, 0), swh: None, mwp: None, tp: None },
        ];
        let days = daily_drivers(&hourly);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].hs_max, Some(2.5));
        assert_eq!(days[0].tp_mean, Some(8.0));
        assert_relative_eq!(days[0].rain_sum, 0.75);
        assert_eq!(days[1].hs_max, None);
        assert_eq!(days[1].rain_sum, 0.0);
    }

    #[test]
    fn test_annual_features() {
        // 2010: ten days, one big storm day; 2011: ten calm days
        let mut hourly = Vec::new();
        for d in 1..=10 {
            let swh = if d == 5 { 4.0 } else { 1.0 };
            let rain = if (3..=5).contains(&d) { 1.0 } else { 0.0 };
            hourly.push(hour(at(2010, 3, d, 0), swh, rain));
            hourly.push(hour(at(2011, 3, d, 0), 1.0, 0.0));
        }
        let rows = annual_features(&hourly, &DriverParams::default());
        assert_eq!(rows.len(), 2);

        let y2010 = rows[0];
        assert_eq!(y2010.year, 2010);
        assert_eq!(y2010.storm_days, 1);
        assert_relative_eq!(y2010.wave_power, 9.0 + 16.0);
        assert_relative_eq!(y2010.rain_3d_max, 3.0);

        // Constant heights make every day reach the 95th percentile
        let y2011 = rows[1];
        assert_eq!(y2011.storm_days, 10);
        assert_relative_eq!(y2011.wave_power, 10.0);

        // 2011 has the most storm days, 2010 the most wave power
        assert_relative_eq!(y2010.storm_index, 0.6 * 0.1 + 0.4, epsilon = 1e-6);
        assert_relative_eq!(y2011.storm_index, 0.6 + 0.4 * 10.0 / 25.0, epsilon = 1e-6);
    }
}
