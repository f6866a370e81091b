//! Transect lookup for serving: typical deltas and nearest-midpoint search

use serde::Serialize;
use shorecast_core::crs::projection::haversine_m;
use shorecast_core::vector::{Transect, TypicalDelta};
use std::collections::HashMap;

use crate::error::{ForecastError, Result};
use crate::{finite, finite_opt};

/// A transect found by [`TransectIndex::nearest`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestTransect {
    pub transect_id: u32,
    pub mid_lon: f64,
    pub mid_lat: f64,
    pub dist_m: f64,
    pub typical_annual_delta_m: Option<f64>,
}

/// One row of the transect listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransectRecord {
    pub transect_id: u32,
    pub mid_lat: Option<f64>,
    pub mid_lon: Option<f64>,
    pub lat1: Option<f64>,
    pub lon1: Option<f64>,
    pub lat2: Option<f64>,
    pub lon2: Option<f64>,
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,
    pub typical_annual_delta_m: Option<f64>,
}

/// Transects in id order with their typical annual deltas
#[derive(Debug, Clone)]
pub struct TransectIndex {
    transects: Vec<Transect>,
    typical: HashMap<u32, f64>,
}

impl TransectIndex {
    /// Index `transects`; duplicate ids keep their first row.
    pub fn new(mut transects: Vec<Transect>, typical: &[TypicalDelta]) -> Self {
        transects.sort_by_key(|t| t.transect_id);
        transects.dedup_by_key(|t| t.transect_id);
        let typical = typical
            .iter()
            .map(|t| (t.transect_id, t.typical_annual_delta_m))
            .collect();
        Self { transects, typical }
    }

    pub fn len(&self) -> usize {
        self.transects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transects.is_empty()
    }

    pub fn transects(&self) -> &[Transect] {
        &self.transects
    }

    /// Typical annual delta of a transect, if known and finite
    pub fn typical(&self, transect_id: u32) -> Option<f64> {
        self.typical.get(&transect_id).copied().and_then(finite)
    }

    /// Whether every transect carries a geographic midpoint
    pub fn enriched(&self) -> bool {
        !self.transects.is_empty() && self.transects.iter().all(|t| t.mid_lonlat().is_some())
    }

    /// The `k` transects (at least one) whose midpoints are closest to
    /// `(lat, lon)` by great-circle distance, nearest first.
    pub fn nearest(&self, lat: f64, lon: f64, k: usize) -> Result<Vec<NearestTransect>> {
        let mut found: Vec<NearestTransect> = self
            .transects
            .iter()
            .filter_map(|t| {
                let (mid_lon, mid_lat) = t.mid_lonlat()?;
                Some(NearestTransect {
                    transect_id: t.transect_id,
                    mid_lon,
                    mid_lat,
                    dist_m: haversine_m(lon, lat, mid_lon, mid_lat),
                    typical_annual_delta_m: self.typical(t.transect_id),
                })
            })
            .filter(|n| n.dist_m.is_finite())
            .collect();
        if found.is_empty() {
            return Err(ForecastError::MissingGeoreference);
        }
        found.sort_by(|a, b| a.dist_m.total_cmp(&b.dist_m));
        found.truncate(k.max(1));
        Ok(found)
    }

    /// Every transect with its geometry and typical delta
    pub fn table(&self) -> Vec<TransectRecord> {
        self.transects
            .iter()
            .map(|t| TransectRecord {
                transect_id: t.transect_id,
                mid_lat: finite_opt(t.mid_lat),
                mid_lon: finite_opt(t.mid_lon),
                lat1: finite_opt(t.lat1),
                lon1: finite_opt(t.lon1),
                lat2: finite_opt(t.lat2),
                lon2: finite_opt(t.lon2),
                x1: finite(t.x1),
                y1: finite(t.y1),
                x2: finite(t.x2),
                y2: finite(t.y2),
                typical_annual_delta_m: self.typical(t.transect_id),
            })
            .collect()
    }
}
