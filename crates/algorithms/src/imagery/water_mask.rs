//! Binary water mask from a water-index raster
//!
//! Pixels are split into water/land by a fixed or percentile threshold.
//! When the split is implausible (almost all water or almost all land) the
//! opposite polarity is tried, then a split at the 35th/65th percentile
//! midpoint, and finally whichever candidate is closest to half water.
//! That last pick ranges over all four splits tried (both polarities at the
//! requested threshold and both at the midpoint), not only the first pair.

use rayon::prelude::*;
use shorecast_core::raster::{Raster, RasterElement};
use shorecast_core::Result;

use crate::statistics::percentile_sorted;

/// Mask value for water pixels
pub const WATER: u8 = 1;
/// Mask value for land pixels
pub const LAND: u8 = 0;
/// Mask value for pixels with no valid index sample
pub const MASK_NODATA: u8 = 255;

/// Valid-range width beyond which samples are rescaled to 0..1
const RESCALE_RANGE: f64 = 2.0;
const AUTO_PERCENTILE: f64 = 60.0;
/// Water fractions at or beyond these bounds are implausible
const PLAUSIBLE: (f64, f64) = (0.02, 0.98);
/// Acceptance band for the percentile-midpoint split
const MIDPOINT_BAND: (f64, f64) = (0.05, 0.95);

/// Threshold selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// 60th percentile of the valid (possibly rescaled) samples
    Auto,
    /// Fixed index value
    Fixed(f64),
}

/// Which side of the threshold is water
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterPolarity {
    /// `value >= threshold` is water (NDWI convention)
    High,
    /// `value <= threshold` is water
    Low,
}

impl WaterPolarity {
    pub fn opposite(self) -> Self {
        match self {
            WaterPolarity::High => WaterPolarity::Low,
            WaterPolarity::Low => WaterPolarity::High,
        }
    }

    fn is_water(self, value: f64, threshold: f64) -> bool {
        match self {
            WaterPolarity::High => value >= threshold,
            WaterPolarity::Low => value <= threshold,
        }
    }
}

/// Parameters for water mask extraction
#[derive(Debug, Clone)]
pub struct WaterMaskParams {
    pub threshold: Threshold,
    pub polarity: WaterPolarity,
    /// Rescale valid samples to 0..1 when their range exceeds 2
    pub auto_rescale: bool,
}

impl Default for WaterMaskParams {
    fn default() -> Self {
        Self {
            threshold: Threshold::Auto,
            polarity: WaterPolarity::High,
            auto_rescale: true,
        }
    }
}

/// Which branch produced the final mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStrategy {
    /// Configured threshold and polarity
    Primary,
    /// Configured threshold, opposite polarity
    OppositePolarity,
    /// Split at the midpoint of the 35th and 65th percentiles
    PercentileMidpoint,
    /// No branch was plausible; candidate closest to half water
    ClosestToHalf,
}

/// Result of water mask extraction
#[derive(Debug, Clone)]
pub struct WaterMask {
    /// `WATER`/`LAND`/`MASK_NODATA` grid with the source georeferencing
    pub mask: Raster<u8>,
    /// Threshold actually applied (in rescaled units if rescaled)
    pub threshold: f64,
    pub polarity: WaterPolarity,
    /// Water pixels over valid pixels
    pub water_fraction: f64,
    pub strategy: MaskStrategy,
    pub rescaled: bool,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    threshold: f64,
    polarity: WaterPolarity,
    fraction: f64,
}

fn in_band(fraction: f64, band: (f64, f64)) -> bool {
    fraction > band.0 && fraction < band.1
}

/// Extract a binary water mask.
///
/// Returns `Ok(None)` when the raster has no valid samples.
pub fn water_mask<T: RasterElement>(
    raster: &Raster<T>,
    params: &WaterMaskParams,
) -> Result<Option<WaterMask>> {
    let (rows, cols) = raster.shape();

    // NaN marks missing samples from here on
    let mut values: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                f64::NAN
            } else {
                v.as_f64().filter(|x| x.is_finite()).unwrap_or(f64::NAN)
            }
        })
        .collect();

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Ok(None);
    }
    sorted.sort_by(f64::total_cmp);
    let valid_count = sorted.len();

    let (vmin, vmax) = (sorted[0], sorted[valid_count - 1]);
    let rescaled = params.auto_rescale && (vmax - vmin) > RESCALE_RANGE;
    if rescaled {
        let span = vmax - vmin + 1e-9;
        values.iter_mut().for_each(|v| *v = (*v - vmin) / span);
        sorted.iter_mut().for_each(|v| *v = (*v - vmin) / span);
    }

    let threshold = match params.threshold {
        Threshold::Auto => percentile_sorted(&sorted, AUTO_PERCENTILE).unwrap_or(vmin),
        Threshold::Fixed(t) => t,
    };

    let split = |threshold: f64, polarity: WaterPolarity| {
        let water = sorted
            .iter()
            .filter(|&&v| polarity.is_water(v, threshold))
            .count();
        Split {
            threshold,
            polarity,
            fraction: water as f64 / valid_count as f64,
        }
    };

    let primary = split(threshold, params.polarity);
    let (chosen, strategy) = if in_band(primary.fraction, PLAUSIBLE) {
        (primary, MaskStrategy::Primary)
    } else {
        let alt = split(threshold, params.polarity.opposite());
        if in_band(alt.fraction, PLAUSIBLE) {
            (alt, MaskStrategy::OppositePolarity)
        } else {
            let lo = percentile_sorted(&sorted, 35.0).unwrap_or(vmin);
            let hi = percentile_sorted(&sorted, 65.0).unwrap_or(vmax);
            let mid = 0.5 * (lo + hi);
            let above = split(mid, WaterPolarity::High);
            let below = split(mid, WaterPolarity::Low);
            if in_band(above.fraction, MIDPOINT_BAND) {
                (above, MaskStrategy::PercentileMidpoint)
            } else if in_band(below.fraction, MIDPOINT_BAND) {
                (below, MaskStrategy::PercentileMidpoint)
            } else {
                let closest = [primary, alt, above, below]
                    .into_iter()
                    .fold(primary, |best, c| {
                        if (c.fraction - 0.5).abs() < (best.fraction - 0.5).abs() {
                            c
                        } else {
                            best
                        }
                    });
                (closest, MaskStrategy::ClosestToHalf)
            }
        }
    };

    tracing::debug!(
        threshold = chosen.threshold,
        fraction = chosen.fraction,
        ?strategy,
        rescaled,
        "water mask"
    );

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![MASK_NODATA; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = values[row * cols + col];
                if v.is_nan() {
                    continue;
                }
                *out = if chosen.polarity.is_water(v, chosen.threshold) {
                    WATER
                } else {
                    LAND
                };
            }
            row_data
        })
        .collect();

    let mask = raster.derive(data, Some(MASK_NODATA))?;

    Ok(Some(WaterMask {
        mask,
        threshold: chosen.threshold,
        polarity: chosen.polarity,
        water_fraction: chosen.fraction,
        strategy,
        rescaled,
    }))
}
