//! Cell value trait for water-index and mask rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Water-index images are read as `f32`/`f64`; binary water masks are `u8`.
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Value used for cells that could not be decoded
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn as_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if !self.is_finite() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    };
}

impl_raster_element_float!(f32);
impl_raster_element_float!(f64);

impl RasterElement for u8 {
    fn default_nodata() -> Self {
        u8::MAX
    }

    fn is_nodata(&self, nodata: Option<Self>) -> bool {
        nodata == Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_floats_are_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(f64::INFINITY.is_nodata(None));
        assert!(f32::NEG_INFINITY.is_nodata(None));
        assert!(!0.25f64.is_nodata(None));
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_mask_nodata() {
        assert!(255u8.is_nodata(Some(255)));
        assert!(!1u8.is_nodata(Some(255)));
        assert!(!255u8.is_nodata(None));
    }
}
