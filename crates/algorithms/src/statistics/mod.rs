//! Statistical helpers shared by the mask, feature and training stages
//!
//! - **percentile**: linear-interpolation percentiles, means, rolling sums
//! - **validity**: fraction of present shoreline positions per year/transect

pub mod percentile;
pub mod validity;

pub use percentile::{mean, percentile, percentile_sorted, rolling_sum};
pub use validity::{position_validity, ValidityReport, ValiditySummary, YearValidity};
