//! Coordinate Reference System handling
//!
//! Every coastline and transect in ShoreCast lives in one planar, metre-based
//! projection (Web Mercator, EPSG:3857). [`CRS::to_planar`] moves raster
//! coordinates into that plane; [`projection`] holds the underlying formulas.

pub mod projection;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use projection::{PLANAR_EPSG, WGS84_EPSG};

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT representation, when the source only carried text
    wkt: Option<String>,
}

/// How coordinates of a given CRS reach the planar projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarSource {
    /// Already Web Mercator metres
    WebMercator,
    /// Longitude/latitude degrees on WGS84
    Geographic,
    /// UTM (or MGA) metres for the given zone and hemisphere
    Utm { zone: u32, north: bool },
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(WGS84_EPSG)
    }

    /// Web Mercator (EPSG:3857), the planar working projection
    pub fn web_mercator() -> Self {
        Self::from_epsg(PLANAR_EPSG)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Classify this CRS by the path its coordinates take to EPSG:3857.
    pub fn planar_source(&self) -> Result<PlanarSource> {
        if let Some(code) = self.epsg {
            return match code {
                PLANAR_EPSG | 900_913 => Ok(PlanarSource::WebMercator),
                WGS84_EPSG => Ok(PlanarSource::Geographic),
                _ => projection::parse_utm_epsg(code)
                    .map(|(zone, north)| PlanarSource::Utm { zone, north })
                    .ok_or_else(|| Error::UnsupportedCrs(self.identifier())),
            };
        }

        // Text-only CRS: accept the two common authorities by name
        match &self.wkt {
            Some(wkt) if wkt.contains("3857") => Ok(PlanarSource::WebMercator),
            Some(wkt) if wkt.contains("4326") || wkt.contains("WGS 84\"") => {
                Ok(PlanarSource::Geographic)
            }
            _ => Err(Error::UnsupportedCrs(self.identifier())),
        }
    }

    /// Project a coordinate of this CRS into Web Mercator metres.
    pub fn to_planar(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(self.planar_source()?.to_planar(x, y))
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl PlanarSource {
    /// Source for rasters that carry no CRS at all: treated as WGS84 degrees.
    pub fn for_crs(crs: Option<&CRS>) -> Result<Self> {
        match crs {
            Some(crs) => crs.planar_source(),
            None => Ok(PlanarSource::Geographic),
        }
    }

    /// Project `(x, y)` into Web Mercator metres
    pub fn to_planar(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            PlanarSource::WebMercator => (x, y),
            PlanarSource::Geographic => projection::wgs84_to_web_mercator(x, y),
            PlanarSource::Utm { zone, north } => {
                let (lon, lat) = projection::utm_to_wgs84(x, y, zone, north);
                projection::wgs84_to_web_mercator(lon, lat)
            }
        }
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
