//! Shorecast CLI - shoreline change estimation and forecasting

use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use shorecast_algorithms::drivers::{annual_features, merge_nearest, DriverParams};
use shorecast_algorithms::imagery::{water_mask, Threshold, WaterMaskParams, WaterPolarity};
use shorecast_algorithms::model::artifacts::{DRIVERS_FILE, POSITIONS_FILE};
use shorecast_algorithms::model::{
    evaluate_holdout, save_training_tables, train_model, ModelArtifacts, TrainingParams,
};
use shorecast_algorithms::shoreline::{build_labels, LabelParams};
use shorecast_algorithms::statistics::position_validity;
use shorecast_algorithms::vector::{extract_coastline, TransectParams};
use shorecast_core::io::{
    read_csv, read_geotiff, read_rain_csv, read_wave_csv, write_csv, write_geotiff, write_json,
    year_rasters,
};
use shorecast_core::series::AnnualDriverFeatures;
use shorecast_core::vector::ShorelinePosition;
use shorecast_core::Raster;
use shorecast_forecast::client::DEFAULT_TIMEOUT;
use shorecast_forecast::{
    ForecastConfig, ForecastEngine, OpenWeatherClient, TransectIndex, DEFAULT_SUMMARY_K,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "shorecast")]
#[command(author, version, about = "Shoreline change estimation and 7-day forecasts", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a water-index raster
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Extract a water mask (1 = water, 0 = land, 255 = no data)
    Mask {
        /// Input water-index raster
        input: PathBuf,
        /// Output mask file
        output: PathBuf,
        #[command(flatten)]
        mask: MaskArgs,
    },
    /// Build shoreline labels and driver features, then fit the model
    Train {
        /// Directory of yearly water-index GeoTIFFs (year in file name)
        #[arg(long)]
        ndwi_dir: PathBuf,
        /// Hourly wave CSV (valid_time, swh, mwp)
        #[arg(long)]
        waves: PathBuf,
        /// Hourly rain CSV (valid_time, tp)
        #[arg(long)]
        rain: PathBuf,
        #[command(flatten)]
        mask: MaskArgs,
        /// Baseline year for transects (default: 2010, else earliest modern year)
        #[arg(long)]
        baseline_year: Option<i32>,
        /// Transect spacing along the coastline (m)
        #[arg(long, default_value = "50")]
        spacing: f64,
        /// Transect half-length (m)
        #[arg(long, default_value = "600")]
        half_length: f64,
        /// First training year
        #[arg(long, default_value = "2000")]
        start_year: i32,
        /// Last training year
        #[arg(long, default_value = "2019")]
        end_year: i32,
        /// Artifacts output directory
        #[arg(long, env = "ART_DIR", default_value = "artifacts")]
        art_dir: PathBuf,
    },
    /// Report the share of transects with a measured position, per year and per transect
    Validity {
        #[arg(long, env = "ART_DIR", default_value = "artifacts")]
        art_dir: PathBuf,
    },
    /// Score the trained model on a later hold-out window
    Evaluate {
        #[arg(long, env = "ART_DIR", default_value = "artifacts")]
        art_dir: PathBuf,
        /// First hold-out year
        #[arg(long, default_value = "2020")]
        start_year: i32,
        /// Last hold-out year
        #[arg(long, default_value = "2025")]
        end_year: i32,
    },
    /// Per-transect daily forecast for a location
    Forecast {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        serve: ServeArgs,
        /// Write the forecast JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Daily totals and the transects with the largest weekly change
    Summary {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        serve: ServeArgs,
        /// Transects in each of the top and bottom lists
        #[arg(short, long, default_value_t = DEFAULT_SUMMARY_K)]
        k: usize,
    },
    /// Transects nearest to a location
    Nearest {
        #[command(flatten)]
        location: LocationArgs,
        /// Number of transects
        #[arg(short, long, default_value = "1")]
        k: usize,
        #[arg(long, env = "ART_DIR", default_value = "artifacts")]
        art_dir: PathBuf,
    },
    /// List transects with their geometry and typical annual change
    Transects {
        #[arg(long, env = "ART_DIR", default_value = "artifacts")]
        art_dir: PathBuf,
    },
    /// Model and serving configuration
    Health {
        #[command(flatten)]
        serve: ServeArgs,
    },
}

#[derive(Args)]
struct MaskArgs {
    /// Threshold: "auto" (60th percentile) or a value
    #[arg(long, default_value = "auto")]
    threshold: String,
    /// Which side of the threshold is water: high or low
    #[arg(long, default_value = "high")]
    polarity: String,
    /// Do not rescale wide-range inputs to 0..1
    #[arg(long)]
    no_rescale: bool,
}

#[derive(Args)]
struct LocationArgs {
    /// Latitude (degrees)
    #[arg(long, default_value = "-38.5", allow_hyphen_values = true)]
    lat: f64,
    /// Longitude (degrees)
    #[arg(long, default_value = "145.0", allow_hyphen_values = true)]
    lon: f64,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "ART_DIR", default_value = "artifacts")]
    art_dir: PathBuf,
    /// OpenWeatherMap API key
    #[arg(long, env = "OWM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Cache lifetime (minutes)
    #[arg(long, env = "OWM_CACHE_TTL_MIN", default_value = "45")]
    cache_ttl_min: u32,
    /// Bound on per-transect rescaling of the weekly prediction
    #[arg(long, env = "SCALE_CLAMP", default_value = "3.0")]
    scale_clamp: f64,
    /// UTC offset defining local forecast days
    #[arg(long, default_value = "+10:00", allow_hyphen_values = true)]
    utc_offset: FixedOffset,
    /// Upstream request timeout (seconds)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

#[derive(Serialize)]
struct TransectValidity {
    transect_id: u32,
    valid_frac: f64,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn read_ndwi(path: &Path) -> Result<Raster<f32>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f32> = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn parse_threshold(s: &str) -> Result<Threshold> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(Threshold::Auto),
        v => {
            let value: f64 = v
                .parse()
                .with_context(|| format!("Threshold must be 'auto' or a number, got: {}", s))?;
            Ok(Threshold::Fixed(value))
        }
    }
}

fn parse_polarity(s: &str) -> Result<WaterPolarity> {
    match s.to_lowercase().as_str() {
        "high" | "water-high" => Ok(WaterPolarity::High),
        "low" | "water-low" => Ok(WaterPolarity::Low),
        _ => anyhow::bail!("Unknown polarity: {}. Use high or low.", s),
    }
}

fn mask_params(args: &MaskArgs) -> Result<WaterMaskParams> {
    Ok(WaterMaskParams {
        threshold: parse_threshold(&args.threshold)?,
        polarity: parse_polarity(&args.polarity)?,
        auto_rescale: !args.no_rescale,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

fn engine(serve: ServeArgs) -> Result<ForecastEngine<OpenWeatherClient>> {
    let client = OpenWeatherClient::new(
        serve.api_key.unwrap_or_default(),
        Duration::from_secs(serve.timeout),
    )?;
    let config = ForecastConfig {
        utc_offset: serve.utc_offset,
        cache_ttl_min: serve.cache_ttl_min,
        scale_clamp: serve.scale_clamp,
        ..ForecastConfig::default()
    };
    Ok(ForecastEngine::from_dir(&serve.art_dir, client, config)?)
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_ndwi(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            match raster.crs() {
                Some(crs) => println!("CRS: {}", crs),
                None => println!("CRS: none (treated as EPSG:4326)"),
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Mask ─────────────────────────────────────────────────────
        Commands::Mask {
            input,
            output,
            mask,
        } => {
            let params = mask_params(&mask)?;
            let raster = read_ndwi(&input)?;
            let start = Instant::now();
            let result = water_mask(&raster, &params)
                .context("Failed to extract water mask")?
                .context("Raster has no valid samples")?;
            let coast = extract_coastline(&result.mask).context("Failed to trace coastline")?;
            let elapsed = start.elapsed();

            let pb = spinner("Writing output...");
            write_geotiff(&result.mask, &output).context("Failed to write output")?;
            pb.finish_and_clear();

            println!(
                "Threshold: {:.4} ({:?}, {:?}{})",
                result.threshold,
                result.polarity,
                result.strategy,
                if result.rescaled { ", rescaled" } else { "" }
            );
            println!("Water fraction: {:.3}", result.water_fraction);
            println!("Coastline length: {:.1} m", coast.length());
            done("Water mask", &output, elapsed);
        }

        // ── Train ────────────────────────────────────────────────────
        Commands::Train {
            ndwi_dir,
            waves,
            rain,
            mask,
            baseline_year,
            spacing,
            half_length,
            start_year,
            end_year,
            art_dir,
        } => {
            let start = Instant::now();
            let rasters = year_rasters(&ndwi_dir)
                .with_context(|| format!("Failed to list rasters in {}", ndwi_dir.display()))?;
            if rasters.is_empty() {
                anyhow::bail!("No yearly water-index GeoTIFFs found in {}", ndwi_dir.display());
            }
            info!("Found {} yearly rasters", rasters.len());

            let label_params = LabelParams {
                mask: mask_params(&mask)?,
                transects: TransectParams {
                    spacing,
                    half_length,
                    ..TransectParams::default()
                },
                baseline_year,
            };
            let pb = spinner("Measuring shoreline positions...");
            let labels = build_labels(&rasters, &label_params).context("Failed to build labels")?;
            pb.finish_and_clear();

            let pb = spinner("Computing driver features...");
            let mut wave_obs = read_wave_csv(&waves).context("Failed to read wave series")?;
            let mut rain_obs = read_rain_csv(&rain).context("Failed to read rain series")?;
            wave_obs.sort_by_key(|w| w.time);
            rain_obs.sort_by_key(|r| r.time);
            let drivers = DriverParams::default();
            let hourly = merge_nearest(&wave_obs, &rain_obs, drivers.merge_tolerance);
            let features = annual_features(&hourly, &drivers);
            pb.finish_and_clear();

            let params = TrainingParams {
                start_year,
                end_year,
                ..TrainingParams::default()
            };
            let trained =
                train_model(&labels.positions, &features, &params).context("Training failed")?;

            let artifacts = ModelArtifacts::from_training(&trained, labels.transects);
            save_training_tables(&art_dir, &labels.positions, &features)
                .context("Failed to write training tables")?;
            artifacts
                .save(&art_dir)
                .context("Failed to write model artifacts")?;

            println!("Baseline year: {}", labels.baseline_year);
            println!("Transects: {}", artifacts.transects.len());
            println!(
                "Samples: {} ({} before trimming)",
                trained.samples.len(),
                trained.samples_pre_trim
            );
            println!(
                "Alpha: {}{}",
                trained.selection.alpha,
                if trained.selection.cross_validated() {
                    " (leave-one-year-out)"
                } else {
                    " (default)"
                }
            );
            println!("In-sample MAE: {:.3} m", trained.in_sample_mae);
            println!(
                "Global mean delta: {:.3} m/yr",
                trained.metadata.global_mean_delta
            );
            done("Artifacts", &art_dir, start.elapsed());
        }

        // ── Validity ─────────────────────────────────────────────────
        Commands::Validity { art_dir } => {
            let positions: Vec<ShorelinePosition> = read_csv(art_dir.join(POSITIONS_FILE))
                .context("Failed to read shoreline positions")?;
            let report = position_validity(&positions);

            println!("Valid fraction by year:");
            for y in &report.by_year {
                println!("  {}: {:.3} ({}/{})", y.year, y.valid_frac, y.valid, y.total);
            }
            if let Some(s) = report.transect_summary {
                println!(
                    "Per-transect validity: count {}, mean {:.3}, min {:.3}, max {:.3}",
                    s.count, s.mean, s.min, s.max
                );
            }

            let by_transect: Vec<TransectValidity> = report
                .by_transect
                .iter()
                .map(|(&transect_id, &valid_frac)| TransectValidity {
                    transect_id,
                    valid_frac,
                })
                .collect();
            write_csv(art_dir.join("validity_by_year.csv"), &report.by_year)?;
            write_csv(art_dir.join("validity_by_transect.csv"), &by_transect)?;
            println!(
                "Saved: {} and {}",
                art_dir.join("validity_by_year.csv").display(),
                art_dir.join("validity_by_transect.csv").display()
            );
        }

        // ── Evaluate ─────────────────────────────────────────────────
        Commands::Evaluate {
            art_dir,
            start_year,
            end_year,
        } => {
            let artifacts = ModelArtifacts::load(&art_dir)?;
            let positions: Vec<ShorelinePosition> = read_csv(art_dir.join(POSITIONS_FILE))
                .context("Failed to read shoreline positions")?;
            let features: Vec<AnnualDriverFeatures> = read_csv(art_dir.join(DRIVERS_FILE))
                .context("Failed to read driver features")?;

            let report =
                evaluate_holdout(&artifacts.model, &positions, &features, start_year, end_year)
                    .with_context(|| {
                        format!("No hold-out samples in {}-{}", start_year, end_year)
                    })?;

            let csv_path = art_dir.join(format!("holdout_predictions_{}_{}.csv", start_year, end_year));
            let json_path = art_dir.join(format!("holdout_metrics_{}_{}.json", start_year, end_year));
            write_csv(&csv_path, &report.predictions)?;
            write_json(&json_path, &report)?;

            println!("Hold-out samples: {}", report.n_samples);
            println!("MAE overall: {:.3} m", report.mae_overall_m);
            for (year, mae) in &report.mae_by_year_m {
                println!("  {}: {:.3} m", year, mae);
            }
            println!("Saved: {} and {}", csv_path.display(), json_path.display());
        }

        // ── Serving ──────────────────────────────────────────────────
        Commands::Forecast {
            location,
            serve,
            output,
        } => {
            let engine = engine(serve)?;
            let pb = spinner("Fetching forecast...");
            let forecast = block_on(engine.forecast(location.lat, location.lon))??;
            pb.finish_and_clear();
            match output {
                Some(path) => {
                    write_json(&path, forecast.as_ref())?;
                    println!("Forecast saved to: {}", path.display());
                }
                None => print_json(forecast.as_ref())?,
            }
        }

        Commands::Summary { location, serve, k } => {
            let engine = engine(serve)?;
            let pb = spinner("Fetching forecast...");
            let summary = block_on(engine.summary(location.lat, location.lon, k))??;
            pb.finish_and_clear();
            print_json(&summary)?;
        }

        Commands::Nearest {
            location,
            k,
            art_dir,
        } => {
            let artifacts = ModelArtifacts::load(&art_dir)?;
            let index = TransectIndex::new(artifacts.transects, &artifacts.typical);
            print_json(&index.nearest(location.lat, location.lon, k)?)?;
        }

        Commands::Transects { art_dir } => {
            let artifacts = ModelArtifacts::load(&art_dir)?;
            let index = TransectIndex::new(artifacts.transects, &artifacts.typical);
            print_json(&index.table())?;
        }

        Commands::Health { serve } => {
            let engine = engine(serve)?;
            print_json(&engine.health())?;
            print_json(&engine.cache_stats())?;
        }
    }

    Ok(())
}
