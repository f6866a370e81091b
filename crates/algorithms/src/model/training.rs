//! Training-sample construction and model fitting
//!
//! Year-over-year position changes are joined with that year's driver
//! features, trimmed of extreme tails, and fitted with ridge regression
//! whose strength is chosen by leave-one-year-out cross-validation.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use shorecast_core::series::{AnnualDriverFeatures, DriverFeatures, FEATURE_NAMES};
use shorecast_core::vector::{ShorelinePosition, TypicalDelta};
use shorecast_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::ridge::RidgeModel;
use crate::statistics::{mean, percentile};

/// Parameters for model training
#[derive(Debug, Clone)]
pub struct TrainingParams {
    /// First year of the training window (inclusive)
    pub start_year: i32,
    /// Last year of the training window (inclusive)
    pub end_year: i32,
    /// Trim delta tails only when at least this many samples exist
    pub trim_min_samples: usize,
    /// Lower and upper percentiles kept when trimming
    pub trim_percentiles: (f64, f64),
    /// Fewer samples than this after trimming is a data error
    pub min_samples: usize,
    /// Candidate ridge strengths, tried in order
    pub alphas: Vec<f64>,
    /// Strength used when there are too few years to cross-validate
    pub default_alpha: f64,
    /// Distinct years required for leave-one-year-out selection
    pub min_cv_years: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            start_year: 2000,
            end_year: 2019,
            trim_min_samples: 50,
            trim_percentiles: (1.0, 99.0),
            min_samples: 5,
            alphas: vec![0.1, 0.3, 1.0, 3.0, 10.0, 30.0],
            default_alpha: 1.0,
            min_cv_years: 3,
        }
    }
}

/// Change in shoreline position from `year - 1` to `year`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeltaRecord {
    pub transect_id: u32,
    pub year: i32,
    pub delta_pos_m: f64,
}

/// A delta joined with that year's driver features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub transect_id: u32,
    pub year: i32,
    pub delta_pos_m: f64,
    pub features: DriverFeatures,
}

/// Feature schema and training summary stored next to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub features: Vec<String>,
    pub alpha: f64,
    pub train_years: [i32; 2],
    pub global_mean_delta: f64,
}

/// Cross-validated score of one candidate strength
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlphaScore {
    pub alpha: f64,
    /// Mean over held-out years of the per-year MAE
    pub mae: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlphaSelection {
    pub alpha: f64,
    /// Scores per candidate; empty when too few years to cross-validate
    pub scores: Vec<AlphaScore>,
}

impl AlphaSelection {
    pub fn cross_validated(&self) -> bool {
        !self.scores.is_empty()
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: RidgeModel,
    pub metadata: ModelMetadata,
    pub typical: Vec<TypicalDelta>,
    pub selection: AlphaSelection,
    pub samples_pre_trim: usize,
    pub samples: Vec<TrainingSample>,
    pub in_sample_mae: f64,
}

/// Consecutive-year position changes inside `[start_year, end_year]`.
///
/// A delta exists only where both `year` and `year - 1` have a present
/// position within the window. Output is sorted by transect, then year.
pub fn position_deltas(
    positions: &[ShorelinePosition],
    start_year: i32,
    end_year: i32,
) -> Vec<DeltaRecord> {
    let present: BTreeMap<(u32, i32), f64> = positions
        .iter()
        .filter(|p| (start_year..=end_year).contains(&p.year))
        .filter_map(|p| {
            p.position_m
                .filter(|v| v.is_finite())
                .map(|v| ((p.transect_id, p.year), v))
        })
        .collect();

    present
        .iter()
        .filter_map(|(&(transect_id, year), &pos)| {
            let prev = present.get(&(transect_id, year - 1))?;
            Some(DeltaRecord {
                transect_id,
                year,
                delta_pos_m: pos - prev,
            })
        })
        .collect()
}

/// Join deltas with the driver features of their year.
///
/// Years without a driver row are dropped.
pub fn build_samples(deltas: &[DeltaRecord], features: &[AnnualDriverFeatures]) -> Vec<TrainingSample> {
    let by_year: HashMap<i32, DriverFeatures> =
        features.iter().map(|f| (f.year, f.features())).collect();
    deltas
        .iter()
        .filter_map(|d| {
            by_year.get(&d.year).map(|&features| TrainingSample {
                transect_id: d.transect_id,
                year: d.year,
                delta_pos_m: d.delta_pos_m,
                features,
            })
        })
        .collect()
}

/// Drop samples whose delta lies outside the configured percentile band.
///
/// Applied only when at least `trim_min_samples` samples exist; bounds
/// are inclusive.
pub fn trim_outliers(samples: Vec<TrainingSample>, params: &TrainingParams) -> Vec<TrainingSample> {
    if samples.len() < params.trim_min_samples {
        return samples;
    }
    let deltas: Vec<f64> = samples.iter().map(|s| s.delta_pos_m).collect();
    let (Some(lo), Some(hi)) = (
        percentile(&deltas, params.trim_percentiles.0),
        percentile(&deltas, params.trim_percentiles.1),
    ) else {
        return samples;
    };
    samples
        .into_iter()
        .filter(|s| s.delta_pos_m >= lo && s.delta_pos_m <= hi)
        .collect()
}

fn design_matrix(samples: &[&TrainingSample]) -> (Array2<f64>, Array1<f64>) {
    let mut x = Array2::zeros((samples.len(), FEATURE_NAMES.len()));
    for (i, s) in samples.iter().enumerate() {
        for (j, v) in s.features.to_array().into_iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    let y = samples.iter().map(|s| s.delta_pos_m).collect();
    (x, y)
}

fn mean_absolute_error(model: &RidgeModel, samples: &[&TrainingSample]) -> f64 {
    let errors: Vec<f64> = samples
        .iter()
        .map(|s| (model.predict(&s.features.to_array()) - s.delta_pos_m).abs())
        .collect();
    mean(&errors).unwrap_or(f64::NAN)
}

/// Pick the ridge strength by leave-one-year-out cross-validation.
///
/// Each fold fits on every year except the held-out one and scores MAE on
/// the held-out year only; a candidate's score is the mean over folds. The
/// first candidate with the lowest score wins. With fewer than
/// `min_cv_years` distinct years the default strength is returned.
pub fn select_alpha(samples: &[TrainingSample], params: &TrainingParams) -> Result<AlphaSelection> {
    let years: BTreeSet<i32> = samples.iter().map(|s| s.year).collect();
    if years.len() < params.min_cv_years || params.alphas.is_empty() {
        return Ok(AlphaSelection {
            alpha: params.default_alpha,
            scores: Vec::new(),
        });
    }

    let mut scores = Vec::with_capacity(params.alphas.len());
    for &alpha in &params.alphas {
        let mut fold_mae = Vec::with_capacity(years.len());
        for &held_out in &years {
            let (test, train): (Vec<&TrainingSample>, Vec<&TrainingSample>) =
                samples.iter().partition(|s| s.year == held_out);
            if test.is_empty() || train.is_empty() {
                continue;
            }
            let (x, y) = design_matrix(&train);
            let model = RidgeModel::fit(x.view(), y.view(), alpha)?;
            fold_mae.push(mean_absolute_error(&model, &test));
        }
        if let Some(mae) = mean(&fold_mae) {
            tracing::info!(alpha, mae, "leave-one-year-out");
            scores.push(AlphaScore { alpha, mae });
        }
    }

    let best = best_score(&scores);

    Ok(AlphaSelection {
        alpha: best.map_or(params.default_alpha, |b| b.alpha),
        scores,
    })
}

/// Lowest finite score; the earlier candidate wins ties
fn best_score(scores: &[AlphaScore]) -> Option<AlphaScore> {
    scores
        .iter()
        .filter(|s| s.mae.is_finite())
        .fold(None, |best, s| match best {
            Some(b) if b.mae <= s.mae => Some(b),
            _ => Some(*s),
        })
}

/// Per-transect mean delta, sorted by transect id
pub fn typical_deltas(samples: &[TrainingSample]) -> Vec<TypicalDelta> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for s in samples {
        let e = sums.entry(s.transect_id).or_default();
        e.0 += s.delta_pos_m;
        e.1 += 1;
    }
    sums.into_iter()
        .map(|(transect_id, (sum, n))| TypicalDelta {
            transect_id,
            typical_annual_delta_m: sum / n as f64,
        })
        .collect()
}

/// Build samples, select the strength, fit the final model and summarise.
///
/// Fails with a data error when fewer than `min_samples` samples survive
/// trimming.
pub fn train_model(
    positions: &[ShorelinePosition],
    features: &[AnnualDriverFeatures],
    params: &TrainingParams,
) -> Result<TrainedModel> {
    let deltas = position_deltas(positions, params.start_year, params.end_year);
    let samples = build_samples(&deltas, features);
    let samples_pre_trim = samples.len();
    tracing::info!(samples = samples_pre_trim, "training samples (pre-trim)");

    let samples = trim_outliers(samples, params);
    tracing::info!(samples = samples.len(), "training samples (post-trim)");

    if samples.len() < params.min_samples {
        return Err(Error::Data(format!(
            "Too few training samples after trimming: {} (need {}). Adjust water-index parameters or transects.",
            samples.len(),
            params.min_samples
        )));
    }

    let selection = select_alpha(&samples, params)?;
    if selection.cross_validated() {
        tracing::info!(alpha = selection.alpha, "selected alpha");
    } else {
        tracing::info!(
            alpha = selection.alpha,
            "using default alpha (not enough distinct years for cross-validation)"
        );
    }

    let all: Vec<&TrainingSample> = samples.iter().collect();
    let (x, y) = design_matrix(&all);
    let model = RidgeModel::fit(x.view(), y.view(), selection.alpha)?;
    let in_sample_mae = mean_absolute_error(&model, &all);
    tracing::info!(mae = in_sample_mae, samples = samples.len(), "in-sample fit");

    let global_mean_delta = y.mean().unwrap_or(0.0);
    let metadata = ModelMetadata {
        features: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        alpha: selection.alpha,
        train_years: [params.start_year, params.end_year],
        global_mean_delta,
    };

    Ok(TrainedModel {
        model,
        metadata,
        typical: typical_deltas(&samples),
        selection,
        samples_pre_trim,
        samples,
        in_sample_mae,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pos(transect_id: u32, year: i32, position_m: Option<f64>) -> ShorelinePosition {
        ShorelinePosition { transect_id, year, position_m }
    }

    fn feats(year: i32, storm_days: u32, wave_power: f64) -> AnnualDriverFeatures {
        AnnualDriverFeatures {
            year,
            storm_days,
            wave_power,
            rain_3d_max: 0.01 * wave_power,
            storm_index: wave_power / 100.0,
        }
    }

    #[test]
    fn test_deltas_need_both_years() {
        let positions = [
            pos(0, 1999, Some(500.0)),
            pos(0, 2000, Some(600.0)),
            pos(0, 2001, Some(597.0)),
            pos(0, 2002, None),
            pos(0, 2003, Some(590.0)),
            pos(1, 2001, Some(610.0)),
            pos(1, 2002, Some(611.5)),
        ];
        let deltas = position_deltas(&positions, 2000, 2019);
        assert_eq!(
            deltas,
            vec![
                DeltaRecord { transect_id: 0, year: 2001, delta_pos_m: -3.0 },
                DeltaRecord { transect_id: 1, year: 2002, delta_pos_m: 1.5 },
            ]
        );
    }

    #[test]
    fn test_samples_inner_join() {
        let deltas = [
            DeltaRecord { transect_id: 0, year: 2001, delta_pos_m: -3.0 },
            DeltaRecord { transect_id: 0, year: 2002, delta_pos_m: -1.0 },
        ];
        let samples = build_samples(&deltas, &[feats(2001, 4, 50.0)]);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].features.storm_days, 4);
    }

    #[test]
    fn test_trim_only_with_enough_samples() {
        let make = |n: usize| -> Vec<TrainingSample> {
            (0..n)
                .map(|i| TrainingSample {
                    transect_id: i as u32,
                    year: 2005,
                    delta_pos_m: if i == 0 { 1000.0 } else { i as f64 },
                    features: DriverFeatures::default(),
                })
                .collect()
        };
        let params = TrainingParams::default();
        assert_eq!(trim_outliers(make(10), &params).len(), 10);
        let trimmed = trim_outliers(make(100), &params);
        assert!(trimmed.len() < 100);
        assert!(trimmed.iter().all(|s| s.delta_pos_m < 1000.0));
    }

    #[test]
    fn test_too_few_samples_is_data_error() {
        let positions = [pos(0, 2000, Some(600.0)), pos(0, 2001, Some(598.0))];
        let err = train_model(&positions, &[feats(2001, 1, 10.0)], &TrainingParams::default());
        assert!(matches!(err, Err(Error::Data(_))));
    }

    #[test]
    fn test_default_alpha_with_two_years() {
        let samples: Vec<TrainingSample> = (0..6)
            .map(|i| TrainingSample {
                transect_id: i,
                year: 2001 + (i as i32 % 2),
                delta_pos_m: -1.0 - i as f64,
                features: feats(2001, i, i as f64).features(),
            })
            .collect();
        let selection = select_alpha(&samples, &TrainingParams::default()).unwrap();
        assert!(!selection.cross_validated());
        assert_relative_eq!(selection.alpha, 1.0);
    }

    /// Deltas that are a clean linear function of storm days
    fn storm_driven(years: std::ops::RangeInclusive<i32>) -> (Vec<ShorelinePosition>, Vec<AnnualDriverFeatures>) {
        let mut positions = Vec::new();
        let mut features = Vec::new();
        let years: Vec<i32> = years.collect();
        for t in 0..4u32 {
            let mut p = 600.0;
            positions.push(pos(t, years[0] - 1, Some(p)));
            for &y in &years {
                let storm_days = (y % 7) as u32;
                p += -0.5 * storm_days as f64 + 0.1 * t as f64;
                positions.push(pos(t, y, Some(p)));
            }
        }
        for &y in &years {
            features.push(feats(y, (y % 7) as u32, 20.0 + (y % 5) as f64));
        }
        (positions, features)
    }

    #[test]
    fn test_train_model_end_to_end() {
        let (positions, features) = storm_driven(2001..=2008);
        let trained = train_model(&positions, &features, &TrainingParams::default()).unwrap();

        assert!(trained.selection.cross_validated());
        assert_eq!(trained.selection.scores.len(), 6);
        assert_eq!(trained.samples.len(), 32);
        assert_eq!(trained.metadata.features, FEATURE_NAMES.to_vec());
        assert_eq!(trained.metadata.train_years, [2000, 2019]);
        assert_eq!(trained.typical.len(), 4);

        let mean_delta = trained.samples.iter().map(|s| s.delta_pos_m).sum::<f64>() / 32.0;
        assert_relative_eq!(trained.metadata.global_mean_delta, mean_delta, epsilon = 1e-12);
        // Storm-heavy years push the prediction landward
        let calm = trained.model.predict(&feats(2000, 0, 22.0).features().to_array());
        let stormy = trained.model.predict(&feats(2000, 6, 22.0).features().to_array());
        assert!(stormy < calm);
    }

    #[test]
    fn test_selected_alpha_is_best_scored() {
        let (positions, features) = storm_driven(2001..=2006);
        let trained = train_model(&positions, &features, &TrainingParams::default()).unwrap();
        let best = trained
            .selection
            .scores
            .iter()
            .map(|s| s.mae)
            .fold(f64::INFINITY, f64::min);
        let chosen = trained
            .selection
            .scores
            .iter()
            .find(|s| s.alpha == trained.selection.alpha)
            .unwrap();
        assert_relative_eq!(chosen.mae, best);
    }

    #[test]
    fn test_fold_scores_exclude_held_out_year() {
        let (positions, features) = storm_driven(2001..=2006);
        let mut samples = build_samples(&position_deltas(&positions, 2000, 2019), &features);
        // An outlying year that a leaky fold would partly absorb
        for s in samples.iter_mut().filter(|s| s.year == 2004) {
            s.delta_pos_m += 40.0;
        }
        let selection = select_alpha(&samples, &TrainingParams::default()).unwrap();
        assert_eq!(selection.scores.len(), 6);

        let fold_mae = |alpha: f64, held_out: i32, leak: bool| {
            let train: Vec<&TrainingSample> = samples
                .iter()
                .filter(|s| leak || s.year != held_out)
                .collect();
            let mut x = Array2::zeros((train.len(), FEATURE_NAMES.len()));
            for (i, s) in train.iter().enumerate() {
                x.row_mut(i).assign(&Array1::from(s.features.to_array().to_vec()));
            }
            let y: Array1<f64> = train.iter().map(|s| s.delta_pos_m).collect();
            let model = RidgeModel::fit(x.view(), y.view(), alpha).unwrap();
            let errors: Vec<f64> = samples
                .iter()
                .filter(|s| s.year == held_out)
                .map(|s| (model.predict(&s.features.to_array()) - s.delta_pos_m).abs())
                .collect();
            errors.iter().sum::<f64>() / errors.len() as f64
        };

        for score in &selection.scores {
            let folds: Vec<f64> = (2001..=2006).map(|y| fold_mae(score.alpha, y, false)).collect();
            let expected = folds.iter().sum::<f64>() / folds.len() as f64;
            assert_relative_eq!(score.mae, expected, epsilon = 1e-9);
        }

        // Fitting with the held-out year included scores it far better
        let alpha = selection.scores[0].alpha;
        assert!(fold_mae(alpha, 2004, true) < fold_mae(alpha, 2004, false) - 1.0);
    }

    #[test]
    fn test_non_finite_scores_never_win() {
        let scores = [
            AlphaScore { alpha: 0.1, mae: 2.0 },
            AlphaScore { alpha: 0.3, mae: f64::NAN },
            AlphaScore { alpha: 1.0, mae: 2.0 },
            AlphaScore { alpha: 3.0, mae: f64::INFINITY },
        ];
        assert_eq!(best_score(&scores).map(|b| b.alpha), Some(0.1));
        assert_eq!(best_score(&scores[1..2]), None);

        let leading_nan = [
            AlphaScore { alpha: 0.1, mae: f64::NAN },
            AlphaScore { alpha: 0.3, mae: 5.0 },
        ];
        assert_eq!(best_score(&leading_nan).map(|b| b.alpha), Some(0.3));
    }
}
