//! Weather provider abstraction and the OpenWeatherMap client.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::error::{ForecastError, Result};
use crate::owm::OneCallResponse;

/// One Call 3.0 endpoint
pub const ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream error bodies are cut to this many characters
const ERROR_BODY_CHARS: usize = 400;

/// Source of live multi-day weather forecasts.
pub trait WeatherProvider: Send + Sync {
    /// Fetch the forecast for a location. Failures are returned, never retried.
    fn fetch(&self, lat: f64, lon: f64) -> impl Future<Output = Result<OneCallResponse>> + Send;
}

/// HTTP client for the OpenWeatherMap One Call API.
pub struct OpenWeatherClient {
    client: Client,
    endpoint: String,
    api_key: String,
    request_timeout: Duration,
}

impl OpenWeatherClient {
    /// Create a client; an empty key fails with [`ForecastError::MissingApiKey`].
    pub fn new(api_key: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ForecastError::MissingApiKey);
        }
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            endpoint: ONE_CALL_URL.to_string(),
            api_key,
            request_timeout,
        })
    }

    /// Point the client at another One Call compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl WeatherProvider for OpenWeatherClient {
    async fn fetch(&self, lat: f64, lon: f64) -> Result<OneCallResponse> {
        tracing::debug!(lat, lon, "fetching weather forecast");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("exclude", "minutely".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::from_transport(e, self.request_timeout))?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ForecastError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        resp.json::<OneCallResponse>()
            .await
            .map_err(|e| ForecastError::from_transport(e, self.request_timeout))
    }
}
