//! Pure-Rust projection formulas (Snyder 1987, USGS Prof. Paper 1395).
//!
//! Covers WGS84 geographic, Web Mercator and UTM north/south zones, which is
//! what Landsat and Sentinel-2 water-index products are delivered in. The
//! Australian MGA grids share the UTM parameters on GRS80, whose difference
//! from WGS84 is well under a millimetre, so they take the UTM path.

// ── WGS84 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m), also the Web Mercator sphere radius
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Latitude limit of the square Web Mercator world
const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_6;

/// EPSG code of the planar working projection (Web Mercator)
pub const PLANAR_EPSG: u32 = 3857;
/// EPSG code of WGS84 geographic coordinates
pub const WGS84_EPSG: u32 = 4326;

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`.
///
/// - EPSG 326xx → zone xx, North hemisphere
/// - EPSG 327xx → zone xx, South hemisphere
/// - EPSG 283xx (GDA94 MGA) and 78xx (GDA2020 MGA) → zone xx, South
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else if (28348..=28358).contains(&epsg) {
        Some((epsg - 28300, false))
    } else if (7846..=7859).contains(&epsg) {
        Some((epsg - 7800, false))
    } else {
        None
    }
}

// ── Web Mercator ─────────────────────────────────────────────────────────

/// WGS84 (longitude, latitude) degrees → Web Mercator (x, y) metres.
///
/// Latitudes beyond the Mercator limit are clamped.
pub fn wgs84_to_web_mercator(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let lat = lat_deg.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT).to_radians();
    let x = A * lon_deg.to_radians();
    let y = A * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Web Mercator (x, y) metres → WGS84 (longitude, latitude) degrees.
pub fn web_mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / A).to_degrees();
    let lat = (2.0 * (y / A).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
    (lon, lat)
}

// ── UTM (Snyder pp. 61-64) ───────────────────────────────────────────────

fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// WGS84 (longitude, latitude) degrees → UTM (easting, northing) metres.
pub fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a = cos_lat * (lon - lon0);
    let m = meridional_arc(lat);

    let a2 = a * a;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    let easting = K0
        * n
        * (a + (1.0 - t + c) * a2 * a / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a / 120.0)
        + FALSE_EASTING;

    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    if north {
        (easting, northing)
    } else {
        (easting, northing + FALSE_NORTHING_SOUTH)
    }
}

/// UTM (easting, northing) metres → WGS84 (longitude, latitude) degrees.
///
/// Footpoint-latitude inversion, Snyder eqs. 8-18 to 8-25.
pub fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };
    let x = easting - FALSE_EASTING;

    let e4 = E2 * E2;
    let e6 = e4 * E2;
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_1me2 = (1.0 - E2).sqrt();
    let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi = phi1.sin();
    let cos_phi = phi1.cos();
    let tan_phi = phi1.tan();

    let c1 = E_PRIME2 * cos_phi * cos_phi;
    let t1 = tan_phi * tan_phi;
    let denom = 1.0 - E2 * sin_phi * sin_phi;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - E2) / denom.powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
        - (n1 * tan_phi / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos_phi;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians).
/// Snyder eq. 3-21.
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Great-circle distance in metres between two WGS84 points (haversine).
pub fn haversine_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    const EARTH_RADIUS_M: f64 = 6_371_000.0;
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parse_utm_codes() {
        assert_eq!(parse_utm_epsg(32630), Some((30, true)));
        assert_eq!(parse_utm_epsg(32755), Some((55, false)));
        assert_eq!(parse_utm_epsg(32600), None);
        assert_eq!(parse_utm_epsg(3857), None);
    }

    #[test]
    fn parse_mga_codes() {
        assert_eq!(parse_utm_epsg(28355), Some((55, false)));
        assert_eq!(parse_utm_epsg(7855), Some((55, false)));
        assert_eq!(parse_utm_epsg(28347), None);
        assert_eq!(parse_utm_epsg(7860), None);
    }

    #[test]
    fn frankston_to_web_mercator() {
        let (x, y) = wgs84_to_web_mercator(145.1231, -38.1432);
        assert_relative_eq!(x, 16_155_029.59, epsilon = 0.01);
        assert_relative_eq!(y, -4_599_674.97, epsilon = 0.01);
    }

    #[test]
    fn web_mercator_roundtrip() {
        let (x, y) = wgs84_to_web_mercator(145.0, -38.5);
        let (lon, lat) = web_mercator_to_wgs84(x, y);
        assert_relative_eq!(lon, 145.0, epsilon = 1e-9);
        assert_relative_eq!(lat, -38.5, epsilon = 1e-9);
    }

    // Madrid: pyproj EPSG:4326 → EPSG:32630 gives (440298.94, 4474257.31)
    #[test]
    fn madrid_wgs84_to_utm30n() {
        let (e, n) = wgs84_to_utm(-3.7037, 40.4168, 30, true);
        assert_relative_eq!(e, 440_298.94, epsilon = 1.0);
        assert_relative_eq!(n, 4_474_257.31, epsilon = 1.0);
    }

    #[test]
    fn utm_roundtrip_southern_hemisphere() {
        let (e, n) = wgs84_to_utm(145.1, -38.15, 55, false);
        let (lon, lat) = utm_to_wgs84(e, n, 55, false);
        assert_relative_eq!(lon, 145.1, epsilon = 1e-6);
        assert_relative_eq!(lat, -38.15, epsilon = 1e-6);
    }

    #[test]
    fn utm_central_meridian_equator() {
        let (lon, lat) = utm_to_wgs84(500_000.0, 0.0, 30, true);
        assert_relative_eq!(lon, -3.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_m(145.0, -38.0, 145.0, -39.0);
        assert_relative_eq!(d, 111_194.9, epsilon = 1.0);
    }
}
