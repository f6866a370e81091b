//! Measurement transects and the shoreline records measured on them

use crate::crs::projection::web_mercator_to_wgs84;
use geo_types::{Coord, Line};
use serde::{Deserialize, Serialize};

/// A fixed measurement segment crossing the coastline.
///
/// Endpoints are Web Mercator metres; `(x1, y1)` is the landward reference
/// end that positions are measured from. Geographic fields are filled by
/// [`Transect::enrich`] and are optional in `transects.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transect {
    pub transect_id: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default)]
    pub mid_lat: Option<f64>,
    #[serde(default)]
    pub mid_lon: Option<f64>,
    #[serde(default)]
    pub lat1: Option<f64>,
    #[serde(default)]
    pub lon1: Option<f64>,
    #[serde(default)]
    pub lat2: Option<f64>,
    #[serde(default)]
    pub lon2: Option<f64>,
}

impl Transect {
    /// Create a transect from planar endpoints, without geographic fields
    pub fn new(transect_id: u32, start: Coord<f64>, end: Coord<f64>) -> Self {
        Self {
            transect_id,
            x1: start.x,
            y1: start.y,
            x2: end.x,
            y2: end.y,
            mid_lat: None,
            mid_lon: None,
            lat1: None,
            lon1: None,
            lat2: None,
            lon2: None,
        }
    }

    pub fn start(&self) -> Coord<f64> {
        Coord {
            x: self.x1,
            y: self.y1,
        }
    }

    pub fn end(&self) -> Coord<f64> {
        Coord {
            x: self.x2,
            y: self.y2,
        }
    }

    pub fn line(&self) -> Line<f64> {
        Line::new(self.start(), self.end())
    }

    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    pub fn midpoint(&self) -> Coord<f64> {
        Coord {
            x: 0.5 * (self.x1 + self.x2),
            y: 0.5 * (self.y1 + self.y2),
        }
    }

    /// Fill the WGS84 midpoint and endpoint coordinates from the planar ones.
    pub fn enrich(&mut self) {
        let mid = self.midpoint();
        let (mid_lon, mid_lat) = web_mercator_to_wgs84(mid.x, mid.y);
        let (lon1, lat1) = web_mercator_to_wgs84(self.x1, self.y1);
        let (lon2, lat2) = web_mercator_to_wgs84(self.x2, self.y2);
        self.mid_lat = Some(mid_lat);
        self.mid_lon = Some(mid_lon);
        self.lat1 = Some(lat1);
        self.lon1 = Some(lon1);
        self.lat2 = Some(lat2);
        self.lon2 = Some(lon2);
    }

    /// Geographic midpoint as `(lon, lat)`, if enriched
    pub fn mid_lonlat(&self) -> Option<(f64, f64)> {
        Some((self.mid_lon?, self.mid_lat?))
    }
}

/// Distance along a transect to the coastline in one year
/// (`shoreline_positions_annual.csv`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShorelinePosition {
    pub transect_id: u32,
    pub year: i32,
    /// Metres from the transect's first endpoint; `None` when no valid crossing
    pub position_m: Option<f64>,
}

/// A transect's mean year-over-year change over the training window
/// (`typical_annual_delta_by_transect.csv`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypicalDelta {
    pub transect_id: u32,
    pub typical_annual_delta_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transect_geometry() {
        let t = Transect::new(7, Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1200.0 });
        assert_relative_eq!(t.length(), 1200.0);
        assert_relative_eq!(t.midpoint().y, 600.0);
        assert_eq!(t.mid_lonlat(), None);
    }

    #[test]
    fn test_enrich_fills_geographic_fields() {
        // Roughly Frankston, Victoria in Web Mercator
        let mut t = Transect::new(
            0,
            Coord { x: 16_155_000.0, y: -4_600_600.0 },
            Coord { x: 16_155_000.0, y: -4_599_400.0 },
        );
        t.enrich();
        let (lon, lat) = t.mid_lonlat().unwrap();
        assert_relative_eq!(lon, 145.1229, epsilon = 1e-3);
        assert_relative_eq!(lat, -38.143, epsilon = 1e-2);
        assert!(t.lat1.unwrap() < t.lat2.unwrap());
    }
}
