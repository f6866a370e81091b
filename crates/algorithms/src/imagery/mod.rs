//! Imagery analysis algorithms
//!
//! - Water mask: adaptive thresholding of a water-index raster

mod water_mask;

pub use water_mask::{
    water_mask, MaskStrategy, Threshold, WaterMask, WaterMaskParams, WaterPolarity, LAND,
    MASK_NODATA, WATER,
};
