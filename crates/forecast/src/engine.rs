//! The forecast engine: live weather to per-transect daily shoreline change.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use shorecast_algorithms::drivers::{daily_forecast, storm_proxies, weekly_features, DriverParams};
use shorecast_algorithms::model::{ModelArtifacts, ModelMetadata, RidgeModel};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::{Clock, LocationKey, SystemClock, TtlCache};
use crate::client::WeatherProvider;
use crate::error::{ForecastError, Result};
use crate::index::TransectIndex;
use crate::owm::OneCallResponse;
use crate::summary::{summarize, ForecastSummary};
use crate::{finite, finite_opt};

/// Melbourne standard time
const DEFAULT_UTC_OFFSET_SECS: i32 = 10 * 3600;

/// Below this magnitude the global mean delta is treated as zero
const GMD_EPS: f64 = 1e-9;

/// Serving configuration
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Offset used to assign forecast steps to local calendar days
    pub utc_offset: FixedOffset,
    /// Number of local days forecast, starting today
    pub horizon_days: usize,
    /// Lifetime of both cache kinds (minutes)
    pub cache_ttl_min: u32,
    /// Maximum entries per cache
    pub cache_capacity: usize,
    /// Bound on the per-transect scale factor magnitude
    pub scale_clamp: f64,
    pub drivers: DriverParams,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS)
                .unwrap_or_else(|| Utc.fix()),
            horizon_days: 7,
            cache_ttl_min: 45,
            cache_capacity: 1024,
            scale_clamp: 3.0,
            drivers: DriverParams::default(),
        }
    }
}

impl ForecastConfig {
    /// Reject settings the engine cannot serve with.
    pub fn validate(&self) -> Result<()> {
        if !self.scale_clamp.is_finite() || self.scale_clamp < 0.0 {
            return Err(ForecastError::InvalidConfig(format!(
                "scale clamp must be a finite non-negative number, got {}",
                self.scale_clamp
            )));
        }
        if self.horizon_days == 0 {
            return Err(ForecastError::InvalidConfig("horizon must be at least one day".into()));
        }
        Ok(())
    }
}

/// One transect on one forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRecord {
    pub transect_id: u32,
    pub date: NaiveDate,
    pub pred_daily_delta_m: Option<f64>,
    pub wind_max_ms: Option<f64>,
    pub gust_max_ms: Option<f64>,
    pub rain_sum_mm: Option<f64>,
    pub typical_annual_delta_m: Option<f64>,
    pub mid_lat: Option<f64>,
    pub mid_lon: Option<f64>,
    pub lat1: Option<f64>,
    pub lon1: Option<f64>,
    pub lat2: Option<f64>,
    pub lon2: Option<f64>,
}

/// Provenance attached to every forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMeta {
    pub timezone: String,
    pub generated_at: DateTime<FixedOffset>,
    pub features_used: Vec<String>,
    pub training_years: [i32; 2],
    pub alpha: f64,
    pub global_mean_delta: f64,
    pub scale_clamp: f64,
    pub cache_ttl_min: u32,
}

/// A complete forecast for one location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResponse {
    pub meta: ForecastMeta,
    pub data: Vec<ForecastRecord>,
}

/// Service status and model provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub features: Vec<String>,
    pub training_years: [i32; 2],
    pub alpha: f64,
    pub global_mean_delta: f64,
    pub scale_clamp: f64,
    pub transects: usize,
    pub cache_ttl_min: u32,
    pub enriched_geo: bool,
}

/// Entry counts of both caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub owm_cache_entries: usize,
    pub forecast_cache_entries: usize,
    pub ttl_min: u32,
}

/// Multiplier from the population-level prediction to a transect's trend.
///
/// `typical / global_mean` clamped to `[-clamp, clamp]`; 1.0 when the
/// transect has no typical delta or the global mean is effectively zero.
pub fn scale_factor(typical: Option<f64>, global_mean_delta: f64, clamp: f64) -> f64 {
    let clamp = clamp.abs();
    match typical {
        Some(t) if t.is_finite() && global_mean_delta.abs() > GMD_EPS => {
            let ratio = t / global_mean_delta;
            if ratio.is_nan() {
                1.0
            } else {
                ratio.max(-clamp).min(clamp)
            }
        }
        _ => 1.0,
    }
}

/// Spread a weekly delta over days by weight.
///
/// Weights are normalised to sum to one; when they sum to zero or less the
/// delta is split evenly.
pub fn distribute_weekly(weekly: f64, weights: &[f64]) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        let share = weekly / weights.len() as f64;
        return vec![share; weights.len()];
    }
    weights.iter().map(|w| weekly * w / total).collect()
}

struct Caches {
    weather: TtlCache<OneCallResponse>,
    forecast: TtlCache<Arc<ForecastResponse>>,
}

/// Serves forecasts from trained artifacts and a weather provider.
///
/// Both caches sit behind one lock. The upstream fetch runs outside it, so
/// concurrent misses for the same location may fetch twice; the later
/// result simply overwrites an equivalent entry.
pub struct ForecastEngine<P, C = SystemClock> {
    model: RidgeModel,
    metadata: ModelMetadata,
    index: TransectIndex,
    provider: P,
    clock: C,
    config: ForecastConfig,
    caches: Mutex<Caches>,
}

impl<P: WeatherProvider> ForecastEngine<P> {
    /// Engine on the system clock
    pub fn new(artifacts: ModelArtifacts, provider: P, config: ForecastConfig) -> Result<Self> {
        Self::with_clock(artifacts, provider, SystemClock, config)
    }

    /// Load artifacts from `dir`, failing fast when any is missing
    pub fn from_dir(dir: &Path, provider: P, config: ForecastConfig) -> Result<Self> {
        let artifacts = ModelArtifacts::load(dir)?;
        Self::new(artifacts, provider, config)
    }
}

impl<P: WeatherProvider, C: Clock> ForecastEngine<P, C> {
    /// Fails when `config` does not validate
    pub fn with_clock(
        artifacts: ModelArtifacts,
        provider: P,
        clock: C,
        config: ForecastConfig,
    ) -> Result<Self> {
        config.validate()?;
        let ttl = chrono::Duration::minutes(i64::from(config.cache_ttl_min));
        let caches = Caches {
            weather: TtlCache::new(config.cache_capacity, ttl),
            forecast: TtlCache::new(config.cache_capacity, ttl),
        };
        let index = TransectIndex::new(artifacts.transects, &artifacts.typical);
        tracing::info!(
            transects = index.len(),
            alpha = artifacts.metadata.alpha,
            global_mean_delta = artifacts.metadata.global_mean_delta,
            "forecast engine ready"
        );
        Ok(Self {
            model: artifacts.model,
            metadata: artifacts.metadata,
            index,
            provider,
            clock,
            config,
            caches: Mutex::new(caches),
        })
    }

    fn caches(&self) -> MutexGuard<'_, Caches> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn index(&self) -> &TransectIndex {
        &self.index
    }

    /// Per-transect, per-day forecast for a location.
    ///
    /// Served from cache while fresh. Upstream failures propagate and are
    /// never cached.
    pub async fn forecast(&self, lat: f64, lon: f64) -> Result<Arc<ForecastResponse>> {
        let key = LocationKey::new(lat, lon);

        let cached = self.caches().forecast.get(&key, self.clock.now());
        if let Some(hit) = cached {
            tracing::debug!(%key, "forecast cache hit");
            return Ok(hit);
        }

        let cached_weather = self.caches().weather.get(&key, self.clock.now());
        let weather = match cached_weather {
            Some(weather) => {
                tracing::debug!(%key, "weather cache hit");
                weather
            }
            None => {
                tracing::debug!(%key, "weather cache miss, fetching upstream");
                let weather = self.provider.fetch(lat, lon).await?;
                self.caches()
                    .weather
                    .put(key, weather.clone(), self.clock.now());
                weather
            }
        };

        let response = Arc::new(self.compute(&weather)?);
        self.caches()
            .forecast
            .put(key, Arc::clone(&response), self.clock.now());
        Ok(response)
    }

    /// Daily totals and the most eroding and accreting transects
    pub async fn summary(&self, lat: f64, lon: f64, k: usize) -> Result<ForecastSummary> {
        let response = self.forecast(lat, lon).await?;
        Ok(summarize(&response, k))
    }

    fn compute(&self, weather: &OneCallResponse) -> Result<ForecastResponse> {
        let now = self.clock.now().with_timezone(&self.config.utc_offset);
        let days = daily_forecast(
            &weather.observations(),
            self.config.utc_offset,
            now.date_naive(),
            self.config.horizon_days,
        );
        if days.is_empty() {
            return Err(ForecastError::NoForecastData);
        }

        let drivers = &self.config.drivers;
        let proxies = storm_proxies(&days, drivers);
        let features = weekly_features(&proxies, drivers);
        let base = self.model.predict(&features.to_array());
        tracing::debug!(
            days = days.len(),
            wave_power = features.wave_power,
            storm_days = features.storm_days,
            base_weekly_delta = base,
            "weekly prediction"
        );

        let weights: Vec<f64> = proxies.iter().map(|p| p.storm_proxy).collect();
        let gmd = self.metadata.global_mean_delta;
        let mut data = Vec::with_capacity(self.index.len() * proxies.len());
        for t in self.index.transects() {
            let typical = self.index.typical(t.transect_id);
            let scale = scale_factor(typical, gmd, self.config.scale_clamp);
            let per_day = distribute_weekly(base * scale, &weights);
            for (p, delta) in proxies.iter().zip(per_day) {
                data.push(ForecastRecord {
                    transect_id: t.transect_id,
                    date: p.day.date,
                    pred_daily_delta_m: finite(delta),
                    wind_max_ms: finite_opt(p.day.wind_max),
                    gust_max_ms: finite_opt(p.day.gust_max),
                    rain_sum_mm: finite(p.day.rain_sum),
                    typical_annual_delta_m: typical,
                    mid_lat: finite_opt(t.mid_lat),
                    mid_lon: finite_opt(t.mid_lon),
                    lat1: finite_opt(t.lat1),
                    lon1: finite_opt(t.lon1),
                    lat2: finite_opt(t.lat2),
                    lon2: finite_opt(t.lon2),
                });
            }
        }

        Ok(ForecastResponse {
            meta: ForecastMeta {
                timezone: self.config.utc_offset.to_string(),
                generated_at: now,
                features_used: self.metadata.features.clone(),
                training_years: self.metadata.train_years,
                alpha: self.metadata.alpha,
                global_mean_delta: gmd,
                scale_clamp: self.config.scale_clamp,
                cache_ttl_min: self.config.cache_ttl_min,
            },
            data,
        })
    }

    pub fn health(&self) -> Health {
        Health {
            status: "ok",
            features: self.metadata.features.clone(),
            training_years: self.metadata.train_years,
            alpha: self.metadata.alpha,
            global_mean_delta: self.metadata.global_mean_delta,
            scale_clamp: self.config.scale_clamp,
            transects: self.index.len(),
            cache_ttl_min: self.config.cache_ttl_min,
            enriched_geo: self.index.enriched(),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let caches = self.caches();
        CacheStats {
            owm_cache_entries: caches.weather.len(),
            forecast_cache_entries: caches.forecast.len(),
            ttl_min: self.config.cache_ttl_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_factor_clamped() {
        assert_relative_eq!(scale_factor(Some(-4.0), -2.0, 3.0), 2.0);
        assert_relative_eq!(scale_factor(Some(-20.0), -2.0, 3.0), 3.0);
        assert_relative_eq!(scale_factor(Some(20.0), -2.0, 3.0), -3.0);
    }

    #[test]
    fn test_scale_factor_defaults_to_one() {
        assert_eq!(scale_factor(None, -2.0, 3.0), 1.0);
        assert_eq!(scale_factor(Some(-4.0), 0.0, 3.0), 1.0);
        assert_eq!(scale_factor(Some(-4.0), 1e-12, 3.0), 1.0);
        assert_eq!(scale_factor(Some(f64::NAN), -2.0, 3.0), 1.0);
    }

    #[test]
    fn test_distribute_even_when_no_weight() {
        let per_day = distribute_weekly(-7.0, &[0.0; 7]);
        assert_eq!(per_day.len(), 7);
        assert!(per_day.iter().all(|&d| (d + 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_distribute_proportional() {
        let per_day = distribute_weekly(-6.0, &[1.0, 0.0, 2.0]);
        assert_relative_eq!(per_day[0], -2.0);
        assert_relative_eq!(per_day[1], 0.0);
        assert_relative_eq!(per_day[2], -4.0);
        assert_relative_eq!(per_day.iter().sum::<f64>(), -6.0);
        assert!(distribute_weekly(-6.0, &[]).is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = ForecastConfig::default();
        assert_eq!(config.utc_offset.local_minus_utc(), 36000);
        assert_eq!(config.utc_offset.to_string(), "+10:00");
        assert_eq!(config.horizon_days, 7);
        assert_eq!(config.cache_ttl_min, 45);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_clamp() {
        for clamp in [f64::NAN, f64::INFINITY, -1.0] {
            let config = ForecastConfig {
                scale_clamp: clamp,
                ..ForecastConfig::default()
            };
            assert!(matches!(config.validate(), Err(ForecastError::InvalidConfig(_))));
        }
        let config = ForecastConfig {
            horizon_days: 0,
            ..ForecastConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
