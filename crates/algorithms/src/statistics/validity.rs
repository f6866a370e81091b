//! Position validity report
//!
//! How often each year's coastline produced a usable crossing, and how that
//! is distributed across transects.

use serde::Serialize;
use shorecast_core::vector::ShorelinePosition;
use std::collections::BTreeMap;

/// Share of transects with a present position in one year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValidity {
    pub year: i32,
    pub valid: usize,
    pub total: usize,
    pub valid_frac: f64,
}

/// count/mean/min/max of per-transect validity fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValiditySummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidityReport {
    pub by_year: Vec<YearValidity>,
    pub by_transect: BTreeMap<u32, f64>,
    pub transect_summary: Option<ValiditySummary>,
}

pub fn position_validity(positions: &[ShorelinePosition]) -> ValidityReport {
    let mut years: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    let mut transects: BTreeMap<u32, (usize, usize)> = BTreeMap::new();

    for p in positions {
        let present = usize::from(p.position_m.is_some_and(f64::is_finite));
        let y = years.entry(p.year).or_default();
        y.0 += present;
        y.1 += 1;
        let t = transects.entry(p.transect_id).or_default();
        t.0 += present;
        t.1 += 1;
    }

    let by_year = years
        .into_iter()
        .map(|(year, (valid, total))| YearValidity {
            year,
            valid,
            total,
            valid_frac: valid as f64 / total as f64,
        })
        .collect();

    let by_transect: BTreeMap<u32, f64> = transects
        .into_iter()
        .map(|(id, (valid, total))| (id, valid as f64 / total as f64))
        .collect();

    let transect_summary = if by_transect.is_empty() {
        None
    } else {
        let fracs: Vec<f64> = by_transect.values().copied().collect();
        Some(ValiditySummary {
            count: fracs.len(),
            mean: fracs.iter().sum::<f64>() / fracs.len() as f64,
            min: fracs.iter().copied().fold(f64::INFINITY, f64::min),
            max: fracs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    };

    ValidityReport {
        by_year,
        by_transect,
        transect_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pos(transect_id: u32, year: i32, position_m: Option<f64>) -> ShorelinePosition {
        ShorelinePosition { transect_id, year, position_m }
    }

    #[test]
    fn test_validity_fractions() {
        let report = position_validity(&[
            pos(0, 2010, Some(600.0)),
            pos(1, 2010, Some(601.0)),
            pos(0, 2011, Some(595.0)),
            pos(1, 2011, None),
        ]);
        assert_eq!(report.by_year.len(), 2);
        assert_relative_eq!(report.by_year[0].valid_frac, 1.0);
        assert_relative_eq!(report.by_year[1].valid_frac, 0.5);
        assert_relative_eq!(report.by_transect[&1], 0.5);

        let s = report.transect_summary.unwrap();
        assert_eq!(s.count, 2);
        assert_relative_eq!(s.mean, 0.75);
        assert_relative_eq!(s.min, 0.5);
    }

    #[test]
    fn test_empty_positions() {
        let report = position_validity(&[]);
        assert!(report.by_year.is_empty());
        assert!(report.transect_summary.is_none());
    }
}
