use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{CityName, FetchError, WeatherReading};

use super::{ProviderId, WeatherProvider, endpoint, get_json};

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";

/// Days of forecast requested; the full outlook stays in the raw payload.
const FORECAST_DAYS: &str = "3";

/// Forecast adapter for WeatherAPI.com `GET /v1/forecast.json`.
///
/// The normalized reading comes from the `current` block; the multi-day
/// `forecast` block is only kept in the raw payload.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_f: f64,
    feelslike_f: f64,
    humidity: u8,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: String,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    current: WaCurrent,
    forecast: WaForecast,
}

fn normalize(parsed: WaForecastResponse, raw: serde_json::Value) -> WeatherReading {
    tracing::debug!(
        provider = "weatherapi",
        days = parsed.forecast.forecastday.len(),
        first = parsed.forecast.forecastday.first().map(|d| d.date.as_str()).unwrap_or("-"),
        "forecast outlook received"
    );

    WeatherReading {
        provider: ProviderId::WeatherApi,
        temperature_f: parsed.current.temp_f,
        feels_like_f: parsed.current.feelslike_f,
        humidity_pct: parsed.current.humidity,
        condition_text: parsed.current.condition.text,
        raw,
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn fetch(&self, city: &CityName) -> Result<WeatherReading, FetchError> {
        let url = endpoint(&self.base_url, "/v1/forecast.json");

        tracing::debug!(provider = "weatherapi", %city, "requesting forecast");

        let (parsed, raw) = get_json::<WaForecastResponse>(
            &self.http,
            ProviderId::WeatherApi,
            &url,
            &[
                ("key", self.api_key.as_str()),
                ("q", city.as_str()),
                ("days", FORECAST_DAYS),
            ],
        )
        .await?;

        Ok(normalize(parsed, raw))
    }
}
