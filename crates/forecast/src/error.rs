//! Error types for the forecast service.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while serving forecasts.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("weather provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not reach weather provider: {0}")]
    Connection(String),

    #[error("weather provider returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("artifacts missing in {dir}: {}; run `shorecast train` first", missing.join(", "))]
    MissingArtifacts { dir: String, missing: Vec<String> },

    #[error("invalid forecast configuration: {0}")]
    InvalidConfig(String),

    #[error("OWM_API_KEY is not set")]
    MissingApiKey,

    #[error("no forecast data for the requested location and time")]
    NoForecastData,

    #[error("transect midpoints are not available; retrain to enrich transects")]
    MissingGeoreference,

    #[error("core error: {0}")]
    Core(shorecast_core::Error),
}

impl From<shorecast_core::Error> for ForecastError {
    fn from(err: shorecast_core::Error) -> Self {
        match err {
            shorecast_core::Error::MissingArtifacts { dir, missing } => {
                Self::MissingArtifacts { dir, missing }
            }
            other => Self::Core(other),
        }
    }
}

impl ForecastError {
    /// Classify a transport failure as timeout, connection or generic HTTP
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Result alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;
