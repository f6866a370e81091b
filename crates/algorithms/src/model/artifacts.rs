//! Persisted model artifacts
//!
//! Training writes every file at the end of a successful run; serving loads
//! the four required files at startup and refuses to start if any is absent.

use shorecast_core::io::{read_csv, read_json, write_csv, write_json};
use shorecast_core::series::AnnualDriverFeatures;
use shorecast_core::vector::{ShorelinePosition, Transect, TypicalDelta};
use shorecast_core::{Error, Result};
use std::path::Path;

use super::ridge::RidgeModel;
use super::training::{ModelMetadata, TrainedModel};

pub const MODEL_FILE: &str = "model_ridge.json";
pub const METADATA_FILE: &str = "model_features.json";
pub const TRANSECTS_FILE: &str = "transects.csv";
pub const TYPICAL_FILE: &str = "typical_annual_delta_by_transect.csv";
pub const POSITIONS_FILE: &str = "shoreline_positions_annual.csv";
pub const DRIVERS_FILE: &str = "annual_driver_features.csv";

/// Files serving cannot start without
pub const REQUIRED_ARTIFACTS: [&str; 4] = [MODEL_FILE, METADATA_FILE, TRANSECTS_FILE, TYPICAL_FILE];

/// The read-only state the forecast engine runs on
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub model: RidgeModel,
    pub metadata: ModelMetadata,
    pub transects: Vec<Transect>,
    pub typical: Vec<TypicalDelta>,
}

impl ModelArtifacts {
    pub fn from_training(trained: &TrainedModel, transects: Vec<Transect>) -> Self {
        Self {
            model: trained.model.clone(),
            metadata: trained.metadata.clone(),
            transects,
            typical: trained.typical.clone(),
        }
    }

    /// Required artifact files absent from `dir`
    pub fn missing(dir: &Path) -> Vec<String> {
        REQUIRED_ARTIFACTS
            .iter()
            .filter(|name| !dir.join(name).is_file())
            .map(|name| name.to_string())
            .collect()
    }

    /// Load all required artifacts, failing before reading anything if one is missing.
    pub fn load(dir: &Path) -> Result<Self> {
        let missing = Self::missing(dir);
        if !missing.is_empty() {
            return Err(Error::MissingArtifacts {
                dir: dir.display().to_string(),
                missing,
            });
        }

        let artifacts = Self {
            model: read_json(dir.join(MODEL_FILE))?,
            metadata: read_json(dir.join(METADATA_FILE))?,
            transects: read_csv(dir.join(TRANSECTS_FILE))?,
            typical: read_csv(dir.join(TYPICAL_FILE))?,
        };
        tracing::info!(
            transects = artifacts.transects.len(),
            alpha = artifacts.metadata.alpha,
            "loaded artifacts from {}",
            dir.display()
        );
        Ok(artifacts)
    }

    /// Write the four serving artifacts into `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        write_json(dir.join(MODEL_FILE), &self.model)?;
        write_json(dir.join(METADATA_FILE), &self.metadata)?;
        write_csv(dir.join(TRANSECTS_FILE), &self.transects)?;
        write_csv(dir.join(TYPICAL_FILE), &self.typical)?;
        Ok(())
    }
}

/// Write the training-side tables kept for inspection and later evaluation
pub fn save_training_tables(
    dir: &Path,
    positions: &[ShorelinePosition],
    features: &[AnnualDriverFeatures],
) -> Result<()> {
    write_csv(dir.join(POSITIONS_FILE), positions)?;
    write_csv(dir.join(DRIVERS_FILE), features)?;
    Ok(())
}
