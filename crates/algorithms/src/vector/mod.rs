//! Vector stages of shoreline measurement
//!
//! - **coastline**: water/land boundary tracing and fragment merging
//! - **transects**: perpendicular measurement segments along a baseline
//! - **position**: coastline/transect crossings as scalar positions

pub mod coastline;
pub mod position;
pub mod transects;

pub use coastline::{coastline_fragments, extract_coastline, Coastline};
pub use position::{measure_positions, resolve_crossing, shoreline_position, Crossing};
pub use transects::{build_transects, TransectParams};
