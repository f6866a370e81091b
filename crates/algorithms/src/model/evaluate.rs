//! Hold-out evaluation on years after the training window

use serde::{Deserialize, Serialize};
use shorecast_core::series::AnnualDriverFeatures;
use shorecast_core::vector::ShorelinePosition;
use std::collections::BTreeMap;

use super::ridge::RidgeModel;
use super::training::{build_samples, position_deltas};

/// Number of worst transects listed in the report
const WORST_TRANSECTS: usize = 10;

/// One hold-out prediction (`holdout_predictions_*.csv`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoldoutPrediction {
    pub transect_id: u32,
    pub year: i32,
    pub delta_true_m: f64,
    pub delta_pred_m: f64,
    pub abs_err_m: f64,
}

/// Hold-out metrics (`holdout_metrics_*.json`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldoutReport {
    pub holdout_years: [i32; 2],
    pub n_samples: usize,
    pub mae_overall_m: f64,
    pub mae_by_year_m: BTreeMap<i32, f64>,
    pub worst_10_transects_by_mae: Vec<u32>,
    #[serde(skip)]
    pub predictions: Vec<HoldoutPrediction>,
}

/// Score a trained model on deltas inside `[start_year, end_year]`.
///
/// Returns `None` when the window holds no samples.
pub fn evaluate_holdout(
    model: &RidgeModel,
    positions: &[ShorelinePosition],
    features: &[AnnualDriverFeatures],
    start_year: i32,
    end_year: i32,
) -> Option<HoldoutReport> {
    let samples = build_samples(&position_deltas(positions, start_year, end_year), features);
    if samples.is_empty() {
        return None;
    }

    let predictions: Vec<HoldoutPrediction> = samples
        .iter()
        .map(|s| {
            let pred = model.predict(&s.features.to_array());
            HoldoutPrediction {
                transect_id: s.transect_id,
                year: s.year,
                delta_true_m: s.delta_pos_m,
                delta_pred_m: pred,
                abs_err_m: (s.delta_pos_m - pred).abs(),
            }
        })
        .collect();

    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    let mut by_transect: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for p in &predictions {
        let y = by_year.entry(p.year).or_default();
        y.0 += p.abs_err_m;
        y.1 += 1;
        let t = by_transect.entry(p.transect_id).or_default();
        t.0 += p.abs_err_m;
        t.1 += 1;
    }

    let mut worst: Vec<(u32, f64)> = by_transect
        .into_iter()
        .map(|(id, (sum, n))| (id, sum / n as f64))
        .collect();
    worst.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let mae_overall_m =
        predictions.iter().map(|p| p.abs_err_m).sum::<f64>() / predictions.len() as f64;
    let first_year = predictions.iter().map(|p| p.year).min().unwrap_or(start_year);
    let last_year = predictions.iter().map(|p| p.year).max().unwrap_or(end_year);

    tracing::info!(
        mae = mae_overall_m,
        samples = predictions.len(),
        "hold-out evaluation"
    );

    Some(HoldoutReport {
        holdout_years: [first_year, last_year],
        n_samples: predictions.len(),
        mae_overall_m,
        mae_by_year_m: by_year
            .into_iter()
            .map(|(year, (sum, n))| (year, sum / n as f64))
            .collect(),
        worst_10_transects_by_mae: worst
            .into_iter()
            .take(WORST_TRANSECTS)
            .map(|(id, _)| id)
            .collect(),
        predictions,
    })
}
