//! End-to-end shoreline scenario on synthetic data.
//!
//! Three yearly water-index rasters in Web Mercator with 5 m pixels: a
//! straight east-west coastline in 2010, moved 5 m inland in 2011 and
//! another 5 m inland in 2012. Water lies north of the coastline.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use shorecast_algorithms::drivers::{
    annual_features, merge_nearest, storm_proxies, weekly_features, DriverParams,
};
use shorecast_algorithms::model::{position_deltas, train_model, TrainingParams};
use shorecast_algorithms::shoreline::{build_labels, build_labels_with, LabelParams, Labels};
use shorecast_algorithms::statistics::position_validity;
use shorecast_core::io::{write_geotiff, year_rasters};
use shorecast_core::raster::Raster;
use shorecast_core::series::{ForecastDay, RainObservation, WaveObservation};
use shorecast_core::{GeoTransform, CRS};

const ROWS: usize = 200;
const COLS: usize = 100;
const PIXEL: f64 = 5.0;
const ORIGIN: (f64, f64) = (16_150_000.0, -4_590_000.0);

fn ndwi(water_rows: usize) -> Raster<f32> {
    let data = (0..ROWS * COLS)
        .map(|i| if i / COLS < water_rows { 0.5 } else { -0.4 })
        .collect();
    let mut raster = Raster::from_vec(data, ROWS, COLS).unwrap();
    raster.set_transform(GeoTransform::new(ORIGIN.0, ORIGIN.1, PIXEL, -PIXEL));
    raster.set_crs(Some(CRS::web_mercator()));
    raster
}

fn water_rows(year: i32) -> usize {
    100 + (year - 2010) as usize
}

fn labels() -> Labels {
    build_labels_with(
        &[2010, 2011, 2012],
        |year| Ok(ndwi(water_rows(year))),
        &LabelParams::default(),
    )
    .unwrap()
}

/// Hourly drivers for 2010-2012 with a stormier 2012
fn drivers() -> (Vec<WaveObservation>, Vec<RainObservation>) {
    let start = NaiveDate::from_ymd_opt(2010, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut waves = Vec::new();
    let mut rain = Vec::new();
    for step in 0..(3 * 365 * 4) {
        let time = start + Duration::hours(6 * step);
        let phase = step as f64 * 0.05;
        let storm = if step > 2 * 365 * 4 { 1.5 } else { 1.0 };
        waves.push(WaveObservation {
            time,
            swh: Some(storm * (1.2 + 0.8 * phase.sin().abs())),
            mwp: Some(8.0),
        });
        rain.push(RainObservation {
            time: time + Duration::minutes(2),
            tp: Some(0.001 * (1.0 + phase.cos())),
        });
    }
    (waves, rain)
}

#[test]
fn baseline_transects_and_positions() {
    let labels = labels();
    assert_eq!(labels.baseline_year, 2010);
    assert_eq!(labels.transects.len(), 50);
    for (i, t) in labels.transects.iter().enumerate() {
        assert_eq!(t.transect_id, i as u32);
        assert!(t.mid_lat.is_some());
    }
    assert_eq!(labels.positions.len(), 150);

    for p in &labels.positions {
        let pos = p.position_m.expect("every transect crosses the coastline");
        assert!(pos >= 0.0 && pos <= 1200.0);
    }

    let report = position_validity(&labels.positions);
    assert!(report.by_year.iter().all(|y| y.valid_frac == 1.0));
}

#[test]
fn yearly_deltas_are_five_metres_landward() {
    let labels = labels();
    let deltas = position_deltas(&labels.positions, 2000, 2019);
    assert_eq!(deltas.len(), 100);
    for d in &deltas {
        assert!(d.year == 2011 || d.year == 2012);
        assert_relative_eq!(d.delta_pos_m, -5.0, epsilon = 1e-6);
    }
}

#[test]
fn trained_model_predicts_retreat_for_stormy_week() {
    let labels = labels();
    let params = DriverParams::default();
    let (waves, rain) = drivers();
    let hourly = merge_nearest(&waves, &rain, params.merge_tolerance);
    let features = annual_features(&hourly, &params);
    assert_eq!(features.len(), 3);
    assert!(features[2].wave_power > features[0].wave_power);

    let trained = train_model(&labels.positions, &features, &TrainingParams::default()).unwrap();
    assert!(trained.samples.len() >= 5);
    assert_relative_eq!(trained.metadata.global_mean_delta, -5.0, epsilon = 1e-6);
    for typical in &trained.typical {
        assert_relative_eq!(typical.typical_annual_delta_m, -5.0, epsilon = 1e-6);
    }
    assert!(trained.in_sample_mae < 1e-3);

    let week: Vec<ForecastDay> = (1..=7)
        .map(|d| ForecastDay {
            date: NaiveDate::from_ymd_opt(2025, 7, d).unwrap(),
            wind_max: Some(18.0),
            gust_max: Some(25.0),
            rain_sum: 12.0,
        })
        .collect();
    let weekly = weekly_features(&storm_proxies(&week, &params), &params);
    assert_eq!(weekly.storm_days, 7);

    let predicted = trained.model.predict(&weekly.to_array());
    assert!(predicted < 0.0);
    assert_relative_eq!(predicted, -5.0, epsilon = 0.5);
}

#[test]
fn labels_from_geotiff_directory() {
    let dir = tempfile::tempdir().unwrap();
    for year in [2010, 2011, 2012] {
        let path = dir.path().join(format!("ndwi_{}.tif", year));
        write_geotiff(&ndwi(water_rows(year)), &path).unwrap();
    }
    let rasters = year_rasters(dir.path()).unwrap();
    assert_eq!(rasters.len(), 3);

    let labels = build_labels(&rasters, &LabelParams::default()).unwrap();
    let deltas = position_deltas(&labels.positions, 2000, 2019);
    assert_eq!(deltas.len(), 100);
    assert!(deltas.iter().all(|d| (d.delta_pos_m + 5.0).abs() < 1e-6));
}
