//! Coastline vectorization
//!
//! Traces the boundary between water and land pixels of a binary mask,
//! merges the boundary edges into maximal polylines and keeps the longest
//! one as the coastline. Edges are oriented so that water lies on the left
//! of the direction of travel in world coordinates.
//!
//! Only edges shared by a valid water pixel and a valid land pixel count:
//! the raster frame and no-data cells never produce coastline.

use geo::{Coord, LineString};
use shorecast_core::crs::PlanarSource;
use shorecast_core::raster::Raster;
use shorecast_core::Result;
use std::collections::HashMap;

use crate::imagery::{LAND, WATER};

/// A coastline polyline in planar (EPSG:3857) metres, with arc-length lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Coastline {
    line: LineString<f64>,
    /// Cumulative length at each vertex; `cumulative[0] == 0`
    cumulative: Vec<f64>,
}

impl Coastline {
    pub fn new(line: LineString<f64>) -> Self {
        let mut cumulative = Vec::with_capacity(line.0.len());
        let mut acc = 0.0;
        for (i, c) in line.0.iter().enumerate() {
            if i > 0 {
                let p = line.0[i - 1];
                acc += (c.x - p.x).hypot(c.y - p.y);
            }
            cumulative.push(acc);
        }
        Self { line, cumulative }
    }

    /// Coastline with no vertices (extraction failure)
    pub fn empty() -> Self {
        Self::new(LineString::new(Vec::new()))
    }

    pub fn is_empty(&self) -> bool {
        self.line.0.len() < 2
    }

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    /// Point at arc length `distance`, clamped to the ends of the curve
    pub fn interpolate(&self, distance: f64) -> Option<Coord<f64>> {
        let coords = &self.line.0;
        match coords.len() {
            0 => return None,
            1 => return Some(coords[0]),
            _ => {}
        }
        let d = distance.clamp(0.0, self.length());
        // First vertex strictly beyond d, so the segment is [i-1, i]
        let i = self
            .cumulative
            .partition_point(|&c| c <= d)
            .clamp(1, coords.len() - 1);
        let (a, b) = (coords[i - 1], coords[i]);
        let seg = self.cumulative[i] - self.cumulative[i - 1];
        let t = if seg > 0.0 {
            (d - self.cumulative[i - 1]) / seg
        } else {
            0.0
        };
        Some(Coord {
            x: a.x + t * (b.x - a.x),
            y: a.y + t * (b.y - a.y),
        })
    }

    /// Point halfway along the curve
    pub fn midpoint(&self) -> Option<Coord<f64>> {
        self.interpolate(0.5 * self.length())
    }
}

type Corner = (i64, i64);

/// Directed pixel-corner edges between water and land, water on the left in
/// (col, row) space.
fn boundary_edges(mask: &Raster<u8>) -> Vec<(Corner, Corner)> {
    let (rows, cols) = mask.shape();
    let data = mask.data();
    let mut edges = Vec::new();

    let is_land = |r: i64, c: i64| -> bool {
        r >= 0
            && c >= 0
            && (r as usize) < rows
            && (c as usize) < cols
            && data[[r as usize, c as usize]] == LAND
    };

    for row in 0..rows {
        for col in 0..cols {
            if data[[row, col]] != WATER {
                continue;
            }
            let (r, c) = (row as i64, col as i64);
            if is_land(r - 1, c) {
                edges.push(((c, r), (c + 1, r)));
            }
            if is_land(r, c + 1) {
                edges.push(((c + 1, r), (c + 1, r + 1)));
            }
            if is_land(r + 1, c) {
                edges.push(((c + 1, r + 1), (c, r + 1)));
            }
            if is_land(r, c - 1) {
                edges.push(((c, r + 1), (c, r)));
            }
        }
    }
    edges
}

/// Merge directed edges into maximal chains through vertices with exactly
/// one incoming and one outgoing edge. Closed rings come last.
fn merge_edges(edges: &[(Corner, Corner)]) -> Vec<Vec<Corner>> {
    let mut outgoing: HashMap<Corner, Vec<usize>> = HashMap::new();
    let mut in_degree: HashMap<Corner, usize> = HashMap::new();
    for (i, &(a, b)) in edges.iter().enumerate() {
        outgoing.entry(a).or_default().push(i);
        *in_degree.entry(b).or_default() += 1;
    }

    let pass_through = |v: &Corner| {
        in_degree.get(v).copied().unwrap_or(0) == 1
            && outgoing.get(v).map_or(0, Vec::len) == 1
    };

    let mut used = vec![false; edges.len()];
    let mut chains = Vec::new();

    let walk = |start: usize, used: &mut Vec<bool>| {
        let mut chain = vec![edges[start].0];
        let mut current = start;
        loop {
            used[current] = true;
            let end = edges[current].1;
            chain.push(end);
            if !pass_through(&end) {
                break;
            }
            match outgoing.get(&end).and_then(|v| v.first()).copied() {
                Some(next) if !used[next] => current = next,
                _ => break,
            }
        }
        chain
    };

    for i in 0..edges.len() {
        if !used[i] && !pass_through(&edges[i].0) {
            chains.push(walk(i, &mut used));
        }
    }
    for i in 0..edges.len() {
        if !used[i] {
            chains.push(walk(i, &mut used));
        }
    }
    chains
}

/// Drop interior vertices that continue in the same direction
fn simplify_collinear(chain: Vec<Corner>) -> Vec<Corner> {
    if chain.len() < 3 {
        return chain;
    }
    let mut out = Vec::with_capacity(chain.len());
    out.push(chain[0]);
    for w in chain.windows(3) {
        let (a, b, c) = (w[0], w[1], w[2]);
        let cross = (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0);
        if cross != 0 {
            out.push(b);
        }
    }
    if let Some(&last) = chain.last() {
        out.push(last);
    }
    out
}

/// All merged boundary fragments of a water mask, in planar metres.
///
/// Fragments keep water on their left in world coordinates.
pub fn coastline_fragments(mask: &Raster<u8>) -> Result<Vec<Coastline>> {
    let projection = PlanarSource::for_crs(mask.crs())?;
    let transform = mask.transform();
    let flip = !transform.preserves_orientation();

    let edges = boundary_edges(mask);
    let fragments = merge_edges(&edges)
        .into_iter()
        .map(|chain| {
            let mut coords: Vec<Coord<f64>> = simplify_collinear(chain)
                .into_iter()
                .map(|(u, v)| {
                    let (x, y) = transform.corner_to_geo(u as f64, v as f64);
                    let (x, y) = projection.to_planar(x, y);
                    Coord { x, y }
                })
                .collect();
            if flip {
                coords.reverse();
            }
            Coastline::new(LineString::new(coords))
        })
        .collect();
    Ok(fragments)
}

/// The longest merged water/land boundary of a mask.
///
/// A mask without any water/land boundary yields an empty coastline.
pub fn extract_coastline(mask: &Raster<u8>) -> Result<Coastline> {
    let fragments = coastline_fragments(mask)?;
    let count = fragments.len();
    let longest = fragments.into_iter().fold(Coastline::empty(), |best, f| {
        if f.length() > best.length() {
            f
        } else {
            best
        }
    });
    tracing::debug!(fragments = count, length = longest.length(), "coastline");
    Ok(longest)
}
