//! Yearly shoreline labels
//!
//! Picks a baseline year, builds transects on its coastline, then measures
//! every year's coastline on those transects.

use shorecast_core::io::read_geotiff;
use shorecast_core::raster::{Raster, RasterElement};
use shorecast_core::io::tables::MIN_RASTER_YEAR;
use shorecast_core::vector::{ShorelinePosition, Transect};
use shorecast_core::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::imagery::{water_mask, WaterMaskParams};
use crate::vector::{build_transects, extract_coastline, measure_positions, Coastline, TransectParams};

/// Preferred baseline year when available
pub const PREFERRED_BASELINE: i32 = 2010;
/// Earliest year preferred as a fallback baseline
pub const MODERN_ERA_START: i32 = 2000;

/// Parameters for label extraction
#[derive(Debug, Clone, Default)]
pub struct LabelParams {
    pub mask: WaterMaskParams,
    pub transects: TransectParams,
    /// Force a baseline year instead of the automatic choice
    pub baseline_year: Option<i32>,
}

/// Transects plus one position record per (transect, year)
#[derive(Debug, Clone)]
pub struct Labels {
    pub baseline_year: i32,
    pub transects: Vec<Transect>,
    pub positions: Vec<ShorelinePosition>,
}

/// 2010 if present, else the earliest year from 2000 on, else the earliest year
pub fn select_baseline_year<I: IntoIterator<Item = i32>>(years: I) -> Option<i32> {
    let years: Vec<i32> = years.into_iter().collect();
    if years.contains(&PREFERRED_BASELINE) {
        return Some(PREFERRED_BASELINE);
    }
    years
        .iter()
        .copied()
        .filter(|&y| y >= MODERN_ERA_START)
        .min()
        .or_else(|| years.iter().copied().min())
}

/// Water mask and longest coastline of one water-index raster.
///
/// A raster with no valid samples gives an empty coastline.
pub fn coastline_from_raster<T: RasterElement>(
    raster: &Raster<T>,
    params: &WaterMaskParams,
) -> Result<Coastline> {
    match water_mask(raster, params)? {
        Some(mask) => extract_coastline(&mask.mask),
        None => Ok(Coastline::empty()),
    }
}

/// Build labels for `years`, loading each raster on demand.
pub fn build_labels_with<F>(years: &[i32], mut load: F, params: &LabelParams) -> Result<Labels>
where
    F: FnMut(i32) -> Result<Raster<f32>>,
{
    let mut years: Vec<i32> = years.iter().copied().filter(|&y| y >= MIN_RASTER_YEAR).collect();
    years.sort_unstable();
    years.dedup();

    let baseline_year = params
        .baseline_year
        .or_else(|| select_baseline_year(years.iter().copied()))
        .ok_or_else(|| Error::Data("No yearly water-index rasters found".into()))?;

    let baseline = coastline_from_raster(&load(baseline_year)?, &params.mask)?;
    let mut transects = build_transects(&baseline, &params.transects)?;
    transects.iter_mut().for_each(Transect::enrich);
    tracing::info!(baseline_year, transects = transects.len(), "baseline transects");

    let mut positions = Vec::with_capacity(years.len() * transects.len());
    for &year in &years {
        let coast = if year == baseline_year {
            baseline.clone()
        } else {
            coastline_from_raster(&load(year)?, &params.mask)?
        };
        let rows = measure_positions(&coast, &transects, year);
        let valid = rows.iter().filter(|r| r.position_m.is_some()).count();
        tracing::debug!(year, valid, total = rows.len(), "measured positions");
        positions.extend(rows);
    }

    Ok(Labels {
        baseline_year,
        transects,
        positions,
    })
}

/// Build labels from yearly GeoTIFFs discovered by [`year_rasters`](shorecast_core::io::year_rasters).
pub fn build_labels(rasters: &BTreeMap<i32, PathBuf>, params: &LabelParams) -> Result<Labels> {
    let years: Vec<i32> = rasters.keys().copied().collect();
    build_labels_with(
        &years,
        |year| match rasters.get(&year) {
            Some(path) => read_geotiff(path),
            None => Err(Error::Data(format!("No raster for baseline year {}", year))),
        },
        params,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_selection() {
        assert_eq!(select_baseline_year([1990, 2005, 2010, 2015]), Some(2010));
        assert_eq!(select_baseline_year([1990, 2005, 2003]), Some(2003));
        assert_eq!(select_baseline_year([1985, 1975]), Some(1975));
        assert_eq!(select_baseline_year([]), None);
    }

    #[test]
    fn test_no_years_is_data_error() {
        let err = build_labels_with(&[], |_| unreachable!(), &LabelParams::default());
        assert!(matches!(err, Err(Error::Data(_))));
    }
}
