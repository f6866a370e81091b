//! Shoreline position along transects
//!
//! A yearly coastline is intersected with every transect. Resolution order:
//! no crossing gives no position; one crossing gives its distance from the
//! transect start; several crossings pick the one nearest the transect
//! midpoint (then the smaller distance); any collinear overlap falls back
//! to projecting the coastline's own midpoint onto the transect.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line};
use rayon::prelude::*;
use shorecast_core::vector::{ShorelinePosition, Transect};

use super::coastline::Coastline;

/// Crossings closer than this are the same point (shared segment vertices)
const SAME_POINT_M: f64 = 1e-9;
/// Midpoint distances within this are ties
const TIE_M: f64 = 1e-9;

/// How a position was resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    None,
    Single(f64),
    /// Several crossings; the one nearest the transect midpoint
    Nearest(f64),
    /// Curve-on-curve overlap; projected coastline midpoint
    Overlap(f64),
}

impl Crossing {
    pub fn position(self) -> Option<f64> {
        match self {
            Crossing::None => None,
            Crossing::Single(p) | Crossing::Nearest(p) | Crossing::Overlap(p) => Some(p),
        }
    }
}

/// Distance along `line` from its start to the closest point to `p`,
/// clamped to `[0, length]`.
pub fn project(line: &Line<f64>, p: Coord<f64>) -> f64 {
    let d = line.delta();
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 {
        return 0.0;
    }
    let t = ((p.x - line.start.x) * d.x + (p.y - line.start.y) * d.y) / len2;
    t.clamp(0.0, 1.0) * len2.sqrt()
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Resolve where `coast` crosses `transect`.
pub fn resolve_crossing(transect: &Transect, coast: &Coastline) -> Crossing {
    if coast.is_empty() {
        return Crossing::None;
    }
    let line = transect.line();

    let mut points: Vec<Coord<f64>> = Vec::new();
    let mut overlap = false;
    for segment in coast.line_string().lines() {
        match line_intersection(line, segment) {
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                if !points.iter().any(|&p| distance(p, intersection) < SAME_POINT_M) {
                    points.push(intersection);
                }
            }
            Some(LineIntersection::Collinear { .. }) => overlap = true,
            None => {}
        }
    }

    if overlap {
        return match coast.midpoint() {
            Some(mid) => Crossing::Overlap(project(&line, mid)),
            None => Crossing::None,
        };
    }

    match points.as_slice() {
        [] => Crossing::None,
        [p] => Crossing::Single(project(&line, *p)),
        _ => {
            let mid = transect.midpoint();
            let mut best = (f64::INFINITY, f64::INFINITY);
            for &p in &points {
                let (d, along) = (distance(p, mid), project(&line, p));
                let tied = (d - best.0).abs() <= TIE_M;
                if (d < best.0 && !tied) || (tied && along < best.1) {
                    best = (d, along);
                }
            }
            Crossing::Nearest(best.1)
        }
    }
}

/// Shoreline position on `transect` in metres from its start, if any
pub fn shoreline_position(transect: &Transect, coast: &Coastline) -> Option<f64> {
    resolve_crossing(transect, coast).position()
}

/// Measure one year's coastline on every transect, in transect order
pub fn measure_positions(
    coast: &Coastline,
    transects: &[Transect],
    year: i32,
) -> Vec<ShorelinePosition> {
    transects
        .par_iter()
        .map(|t| ShorelinePosition {
            transect_id: t.transect_id,
            year,
            position_m: shoreline_position(t, coast),
        })
        .collect()
}
