//! Shoreline change model
//!
//! - **ridge**: ridge regression with an unpenalised intercept
//! - **training**: deltas, samples, trimming, leave-one-year-out selection
//! - **evaluate**: hold-out scoring on later years
//! - **artifacts**: persisted model, metadata, transects and typical deltas

pub mod artifacts;
pub mod evaluate;
pub mod ridge;
pub mod training;

pub use artifacts::{save_training_tables, ModelArtifacts, REQUIRED_ARTIFACTS};
pub use evaluate::{evaluate_holdout, HoldoutPrediction, HoldoutReport};
pub use ridge::RidgeModel;
pub use training::{
    build_samples, position_deltas, select_alpha, train_model, trim_outliers, typical_deltas,
    AlphaScore, AlphaSelection, DeltaRecord, ModelMetadata, TrainedModel, TrainingParams,
    TrainingSample,
};
