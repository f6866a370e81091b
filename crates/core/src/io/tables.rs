//! CSV and JSON tables: driver inputs, training artifacts, yearly raster discovery

use crate::error::{Error, Result};
use crate::series::{RainObservation, WaveObservation};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Earliest year accepted from a raster file name
pub const MIN_RASTER_YEAR: i32 = 1970;

/// Read every row of a headed CSV file
pub fn read_csv<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// Write rows as a headed CSV file, creating parent directories
pub fn write_csv<T, P>(path: P, rows: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    ensure_parent(path.as_ref())?;
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Write a value as pretty-printed JSON, creating parent directories
pub fn write_json<T, P>(path: P, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    ensure_parent(path.as_ref())?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Parse a reanalysis timestamp (`2010-01-01 06:00:00`, ISO `T` form, or minutes only)
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let text = text.trim().trim_end_matches('Z');
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| Error::Data(format!("Unparseable timestamp '{}'", text)))
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

#[derive(Deserialize)]
struct WaveRow {
    valid_time: String,
    swh: Option<f64>,
    mwp: Option<f64>,
}

#[derive(Deserialize)]
struct RainRow {
    valid_time: String,
    tp: Option<f64>,
}

/// Read an hourly wave CSV with `valid_time`, `swh` and `mwp` columns
pub fn read_wave_csv<P: AsRef<Path>>(path: P) -> Result<Vec<WaveObservation>> {
    let rows: Vec<WaveRow> = read_csv(path)?;
    let mut obs = rows
        .into_iter()
        .map(|r| {
            Ok(WaveObservation {
                time: parse_timestamp(&r.valid_time)?,
                swh: finite(r.swh),
                mwp: finite(r.mwp),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    obs.sort_by_key(|o| o.time);
    Ok(obs)
}

/// Read an hourly rainfall CSV with `valid_time` and `tp` columns
pub fn read_rain_csv<P: AsRef<Path>>(path: P) -> Result<Vec<RainObservation>> {
    let rows: Vec<RainRow> = read_csv(path)?;
    let mut obs = rows
        .into_iter()
        .map(|r| {
            Ok(RainObservation {
                time: parse_timestamp(&r.valid_time)?,
                tp: finite(r.tp),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    obs.sort_by_key(|o| o.time);
    Ok(obs)
}

/// First run of four digits in a file name, read as a year
pub fn year_from_name(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|i| name[i..i + 4].parse().ok())
}

/// Discover yearly GeoTIFFs in `dir`, keyed by the year in their file name.
///
/// Files without a year or with a year before [`MIN_RASTER_YEAR`] are skipped;
/// when several files share a year the first by name wins.
pub fn year_rasters<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<i32, PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        })
        .collect();
    paths.sort();

    let mut years = BTreeMap::new();
    for path in paths {
        let year = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(year_from_name);
        if let Some(year) = year.filter(|&y| y >= MIN_RASTER_YEAR) {
            years.entry(year).or_insert(path);
        }
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::ShorelinePosition;
    use std::io::Write;

    #[test]
    fn test_year_from_name() {
        assert_eq!(year_from_name("ndwi_2015.tif"), Some(2015));
        assert_eq!(year_from_name("L8_20190312_ndwi.tif"), Some(2019));
        assert_eq!(year_from_name("ndwi.tif"), None);
        assert_eq!(year_from_name("ndwi_123.tif"), None);
    }

    #[test]
    fn test_year_rasters_skips_old_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["ndwi_2011.tif", "ndwi_2010.TIF", "scan_1234.tif", "notes_2012.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        let years = year_rasters(dir.path()).unwrap();
        assert_eq!(years.keys().copied().collect::<Vec<_>>(), vec![2010, 2011]);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let a = parse_timestamp("2010-01-01 06:00:00").unwrap();
        let b = parse_timestamp("2010-01-01T06:00:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_read_wave_csv_with_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waves.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "valid_time,latitude,longitude,swh,mwp").unwrap();
        writeln!(f, "2010-01-01 01:00:00,-38.1,145.1,1.5,8.2").unwrap();
        writeln!(f, "2010-01-01 00:00:00,-38.1,145.1,,7.9").unwrap();
        drop(f);

        let obs = read_wave_csv(&path).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].swh, None);
        assert_eq!(obs[1].swh, Some(1.5));
    }

    #[test]
    fn test_positions_csv_roundtrip_keeps_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("positions.csv");
        let rows = vec![
            ShorelinePosition { transect_id: 0, year: 2010, position_m: Some(600.0) },
            ShorelinePosition { transect_id: 1, year: 2010, position_m: None },
        ];
        write_csv(&path, &rows).unwrap();
        let back: Vec<ShorelinePosition> = read_csv(&path).unwrap();
        assert_eq!(back, rows);
    }
}
