//! # ShoreCast Algorithms
//!
//! Shoreline change analysis for ShoreCast.
//!
//! ## Stages
//!
//! - **imagery**: Water mask from a water-index raster
//! - **vector**: Coastline tracing, transect construction, position measurement
//! - **shoreline**: Yearly position labels from a raster series
//! - **drivers**: Annual and weekly storm indicators from weather series
//! - **model**: Ridge regression, leave-one-year-out selection, hold-out evaluation
//! - **statistics**: Percentiles and position validity

pub mod drivers;
pub mod imagery;
pub mod model;
pub mod shoreline;
pub mod statistics;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::drivers::{
        annual_features, daily_forecast, merge_nearest, storm_proxies, weekly_features,
        DriverParams, ProxyDay,
    };
    pub use crate::imagery::{water_mask, Threshold, WaterMask, WaterMaskParams, WaterPolarity};
    pub use crate::model::{
        evaluate_holdout, train_model, ModelArtifacts, ModelMetadata, RidgeModel, TrainedModel,
        TrainingParams,
    };
    pub use crate::shoreline::{build_labels, build_labels_with, LabelParams, Labels};
    pub use crate::statistics::{position_validity, ValidityReport};
    pub use crate::vector::{
        build_transects, extract_coastline, measure_positions, Coastline, TransectParams,
    };
    pub use shorecast_core::prelude::*;
}
