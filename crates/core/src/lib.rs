//! # ShoreCast Core
//!
//! Core types and I/O shared by the ShoreCast crates.
//!
//! This crate provides:
//! - `Raster<T>`: Georeferenced raster grid (water-index images and masks)
//! - `GeoTransform`: Affine pixel-to-world transformation
//! - `CRS`: Coordinate reference system and planar (EPSG:3857) reprojection
//! - `vector`: Transect and shoreline position records
//! - `series`: Hourly driver observations and annual/weekly feature rows
//! - `io`: GeoTIFF reading/writing and CSV/JSON tables

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod series;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::series::{DriverFeatures, FEATURE_NAMES};
    pub use crate::vector::{ShorelinePosition, Transect};
}
