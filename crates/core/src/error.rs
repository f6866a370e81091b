//! Error types for ShoreCast

use thiserror::Error;

/// Main error type for ShoreCast operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Unsupported CRS for planar reprojection: {0}")]
    UnsupportedCrs(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Input data cannot support the requested computation (empty raster,
    /// empty coastline, too few training samples).
    #[error("Data error: {0}")]
    Data(String),

    #[error("Artifacts missing in {dir}: {}", missing.join(", "))]
    MissingArtifacts { dir: String, missing: Vec<String> },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for ShoreCast operations
pub type Result<T> = std::result::Result<T, Error>;
