//! Transect construction along a baseline coastline
//!
//! Samples the coastline at even arc-length steps and lays a fixed-length
//! segment across it at each sample, along the left-hand normal of the local
//! tangent. Since coastlines keep water on their left, every transect starts
//! on the landward side.

use geo::Coord;
use shorecast_core::vector::Transect;
use shorecast_core::{Error, Result};

use super::coastline::Coastline;

/// Parameters for transect construction
#[derive(Debug, Clone)]
pub struct TransectParams {
    /// Target spacing between transects along the coastline (m)
    pub spacing: f64,
    /// Distance from the coastline to each transect end (m)
    pub half_length: f64,
    /// Lower bound on the number of transects
    pub min_count: usize,
    /// Half-width of the finite-difference tangent estimate (m)
    pub tangent_step: f64,
}

impl Default for TransectParams {
    fn default() -> Self {
        Self {
            spacing: 50.0,
            half_length: 600.0,
            min_count: 50,
            tangent_step: 1.0,
        }
    }
}

/// Build transects along a baseline coastline.
///
/// `max(min_count, floor(length / spacing))` samples are taken at evenly
/// spaced arc lengths from 0 to the full length, both ends included.
/// Transect ids follow sampling order starting at 0.
pub fn build_transects(coast: &Coastline, params: &TransectParams) -> Result<Vec<Transect>> {
    if !(params.spacing > 0.0) {
        return Err(Error::InvalidParameter {
            name: "spacing",
            value: params.spacing.to_string(),
            reason: "must be positive".into(),
        });
    }
    if !(params.half_length > 0.0) {
        return Err(Error::InvalidParameter {
            name: "half_length",
            value: params.half_length.to_string(),
            reason: "must be positive".into(),
        });
    }
    if coast.is_empty() || coast.length() <= 0.0 {
        return Err(Error::Data("Baseline coastline extraction failed".into()));
    }

    let length = coast.length();
    let n = params.min_count.max((length / params.spacing).floor() as usize).max(1);
    let step = if n > 1 { length / (n - 1) as f64 } else { 0.0 };

    let mut transects = Vec::with_capacity(n);
    for i in 0..n {
        let d = step * i as f64;
        let (Some(pt), Some(p1), Some(p2)) = (
            coast.interpolate(d),
            coast.interpolate((d - params.tangent_step).max(0.0)),
            coast.interpolate((d + params.tangent_step).min(length)),
        ) else {
            return Err(Error::Algorithm("Coastline interpolation failed".into()));
        };

        let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
        let (nx, ny) = (-dy, dx);
        let norm = nx.hypot(ny) + 1e-9;
        let (nx, ny) = (nx / norm, ny / norm);

        let start = Coord {
            x: pt.x - nx * params.half_length,
            y: pt.y - ny * params.half_length,
        };
        let end = Coord {
            x: pt.x + nx * params.half_length,
            y: pt.y + ny * params.half_length,
        };
        transects.push(Transect::new(i as u32, start, end));
    }

    tracing::info!(count = transects.len(), coastline_m = length, "built transects");
    Ok(transects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::LineString;

    fn straight(length: f64) -> Coastline {
        Coastline::new(LineString::from(vec![(0.0, 0.0), (length, 0.0)]))
    }

    #[test]
    fn test_minimum_count_and_contiguous_ids() {
        let transects = build_transects(&straight(1000.0), &TransectParams::default()).unwrap();
        assert_eq!(transects.len(), 50);
        for (i, t) in transects.iter().enumerate() {
            assert_eq!(t.transect_id, i as u32);
        }
    }

    #[test]
    fn test_spacing_drives_count_on_long_coast() {
        let transects = build_transects(&straight(5000.0), &TransectParams::default()).unwrap();
        assert_eq!(transects.len(), 100);
    }

    #[test]
    fn test_transects_cross_perpendicular_landward_first() {
        let transects = build_transects(&straight(1000.0), &TransectParams::default()).unwrap();
        let t = &transects[0];
        // Eastward coastline: water (left) is north, so the start is south
        assert_relative_eq!(t.x1, 0.0, epsilon = 1e-6);
        assert_relative_eq!(t.y1, -600.0, epsilon = 1e-6);
        assert_relative_eq!(t.y2, 600.0, epsilon = 1e-6);
        assert_relative_eq!(t.length(), 1200.0, epsilon = 1e-5);

        let last = transects.last().unwrap();
        assert_relative_eq!(last.x1, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_repeatable_builds() {
        let coast = Coastline::new(LineString::from(vec![(0.0, 0.0), (300.0, 0.0), (300.0, 400.0)]));
        let a = build_transects(&coast, &TransectParams::default()).unwrap();
        let b = build_transects(&coast, &TransectParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_coastline_fails() {
        let err = build_transects(&Coastline::empty(), &TransectParams::default());
        assert!(matches!(err, Err(Error::Data(_))));
    }
}
