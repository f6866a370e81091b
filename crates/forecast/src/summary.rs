//! Compact forecast summary: daily totals and extreme transects

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::{ForecastMeta, ForecastResponse};
use crate::finite;

/// Default number of transects in each extreme list
pub const DEFAULT_SUMMARY_K: usize = 10;

/// Predicted change summed across all transects for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_m: Option<f64>,
}

/// A transect's net predicted change over the forecast window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransectWeek {
    pub transect_id: u32,
    pub week_sum_m: Option<f64>,
    pub typical_annual_delta_m: Option<f64>,
    pub mid_lat: Option<f64>,
    pub mid_lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub meta: ForecastMeta,
    pub daily_totals: Vec<DailyTotal>,
    /// Most negative weekly change first
    pub top_transects: Vec<TransectWeek>,
    /// The `k` largest weekly changes, still in ascending order
    pub bottom_transects: Vec<TransectWeek>,
}

/// Summarise a forecast. Missing daily deltas count as zero in sums.
pub fn summarize(response: &ForecastResponse, k: usize) -> ForecastSummary {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut weekly: BTreeMap<u32, TransectWeek> = BTreeMap::new();
    let mut sums: BTreeMap<u32, f64> = BTreeMap::new();

    for r in &response.data {
        let delta = r.pred_daily_delta_m.unwrap_or(0.0);
        *daily.entry(r.date).or_default() += delta;
        *sums.entry(r.transect_id).or_default() += delta;
        weekly.entry(r.transect_id).or_insert_with(|| TransectWeek {
            transect_id: r.transect_id,
            week_sum_m: None,
            typical_annual_delta_m: r.typical_annual_delta_m,
            mid_lat: r.mid_lat,
            mid_lon: r.mid_lon,
        });
    }

    let mut weekly: Vec<TransectWeek> = weekly
        .into_values()
        .map(|mut w| {
            w.week_sum_m = sums.get(&w.transect_id).copied().and_then(finite);
            w
        })
        .collect();
    weekly.sort_by(|a, b| {
        let key = |w: &TransectWeek| w.week_sum_m.unwrap_or(f64::INFINITY);
        key(a).total_cmp(&key(b))
    });

    let top = weekly.iter().take(k).cloned().collect();
    let bottom = weekly[weekly.len().saturating_sub(k)..].to_vec();

    ForecastSummary {
        meta: response.meta.clone(),
        daily_totals: daily
            .into_iter()
            .map(|(date, total)| DailyTotal {
                date,
                total_m: finite(total),
            })
            .collect(),
        top_transects: top,
        bottom_transects: bottom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ForecastRecord;
    use approx::assert_relative_eq;
    use chrono::{FixedOffset, TimeZone};

    fn meta() -> ForecastMeta {
        let offset = FixedOffset::east_opt(36000).unwrap();
        ForecastMeta {
            timezone: offset.to_string(),
            generated_at: offset.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            features_used: vec!["storm_days".into()],
            training_years: [2000, 2019],
            alpha: 1.0,
            global_mean_delta: -1.0,
            scale_clamp: 3.0,
            cache_ttl_min: 45,
        }
    }

    fn record(transect_id: u32, day: u32, delta: Option<f64>) -> ForecastRecord {
        ForecastRecord {
            transect_id,
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            pred_daily_delta_m: delta,
            wind_max_ms: None,
            gust_max_ms: None,
            rain_sum_mm: None,
            typical_annual_delta_m: Some(transect_id as f64),
            mid_lat: None,
            mid_lon: None,
            lat1: None,
            lon1: None,
            lat2: None,
            lon2: None,
        }
    }

    #[test]
    fn test_daily_totals_and_extremes() {
        let data = vec![
            record(0, 1, Some(-1.0)),
            record(0, 2, Some(-2.0)),
            record(1, 1, Some(0.5)),
            record(1, 2, None),
            record(2, 1, Some(-0.25)),
            record(2, 2, Some(-0.25)),
        ];
        let summary = summarize(&ForecastResponse { meta: meta(), data }, 2);

        assert_eq!(summary.daily_totals.len(), 2);
        assert_relative_eq!(summary.daily_totals[0].total_m.unwrap(), -0.75);
        assert_relative_eq!(summary.daily_totals[1].total_m.unwrap(), -2.25);

        let top: Vec<u32> = summary.top_transects.iter().map(|w| w.transect_id).collect();
        let bottom: Vec<u32> = summary.bottom_transects.iter().map(|w| w.transect_id).collect();
        assert_eq!(top, vec![0, 2]);
        assert_eq!(bottom, vec![2, 1]);
        assert_eq!(summary.top_transects[0].week_sum_m, Some(-3.0));
        assert_eq!(summary.bottom_transects[1].typical_annual_delta_m, Some(1.0));
    }

    #[test]
    fn test_empty_forecast() {
        let summary = summarize(
            &ForecastResponse {
                meta: meta(),
                data: Vec::new(),
            },
            DEFAULT_SUMMARY_K,
        );
        assert!(summary.daily_totals.is_empty());
        assert!(summary.top_transects.is_empty());
        assert!(summary.bottom_transects.is_empty());
    }
}
