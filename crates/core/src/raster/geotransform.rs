//! Affine pixel-to-world transformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Maps pixel-corner coordinates `(u, v)` (column, row; fractional allowed)
/// to world coordinates `(x, y)`:
/// ```text
/// x = origin_x + u * pixel_width + v * row_rotation
/// y = origin_y + u * col_rotation + v * pixel_height
/// ```
///
/// North-up images have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Pixel width (cell size in X direction)
    pub pixel_width: f64,
    /// Pixel height (cell size in Y direction, usually negative)
    pub pixel_height: f64,
    /// Rotation term applied to the row index in X
    pub row_rotation: f64,
    /// Rotation term applied to the column index in Y
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a north-up transform with no rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// World coordinates of a pixel-corner position.
    ///
    /// `(0, 0)` is the upper-left corner of the upper-left pixel;
    /// `(cols, rows)` is the lower-right corner of the raster.
    pub fn corner_to_geo(&self, u: f64, v: f64) -> (f64, f64) {
        let x = self.origin_x + u * self.pixel_width + v * self.row_rotation;
        let y = self.origin_y + u * self.col_rotation + v * self.pixel_height;
        (x, y)
    }

    /// Determinant of the linear part of the transform.
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Whether pixel space and world space share the same handedness.
    ///
    /// North-up rasters (row index grows southward) mirror the plane, so
    /// this is `false` for them.
    pub fn preserves_orientation(&self) -> bool {
        self.determinant() > 0.0
    }

    /// Cell size (assumes square pixels and no rotation)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of a raster of the given size
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.corner_to_geo(0.0, 0.0),
            self.corner_to_geo(cols as f64, 0.0),
            self.corner_to_geo(0.0, rows as f64),
            self.corner_to_geo(cols as f64, rows as f64),
        ];

        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_centre() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);
        let (x, y) = gt.corner_to_geo(5.5, 10.5);
        assert_relative_eq!(x, 155.0, epsilon = 1e-10);
        assert_relative_eq!(y, 95.0, epsilon = 1e-10);
    }

    #[test]
    fn test_north_up_mirrors_pixel_space() {
        assert!(!GeoTransform::new(0.0, 0.0, 5.0, -5.0).preserves_orientation());
        assert!(GeoTransform::new(0.0, 0.0, 5.0, 5.0).preserves_orientation());
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }
}
