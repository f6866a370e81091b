//! I/O for rasters, tabular artifacts and driver time series

mod geotiff;
pub mod tables;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use tables::{
    read_csv, read_json, read_rain_csv, read_wave_csv, write_csv, write_json, year_rasters,
};
