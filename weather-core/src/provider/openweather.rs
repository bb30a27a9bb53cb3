use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{CityName, FetchError, WeatherReading};

use super::{ProviderId, WeatherProvider, endpoint, get_json};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// Current-weather adapter for `GET /data/2.5/weather`.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    weather: Vec<OwWeather>,
}

fn normalize(parsed: OwCurrentResponse, raw: serde_json::Value) -> Result<WeatherReading, FetchError> {
    let condition_text = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or_else(|| FetchError::Unparseable {
            provider: ProviderId::OpenWeather.as_str(),
            reason: "`weather` array is empty".to_string(),
        })?;

    Ok(WeatherReading {
        provider: ProviderId::OpenWeather,
        temperature_f: parsed.main.temp,
        feels_like_f: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        condition_text,
        raw,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn fetch(&self, city: &CityName) -> Result<WeatherReading, FetchError> {
        let url = endpoint(&self.base_url, "/data/2.5/weather");

        tracing::debug!(provider = "openweather", %city, "requesting current weather");

        let (parsed, raw) = get_json::<OwCurrentResponse>(
            &self.http,
            ProviderId::OpenWeather,
            &url,
            &[
                ("q", city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "imperial"),
            ],
        )
        .await?;

        normalize(parsed, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: serde_json::Value) -> Result<WeatherReading, FetchError> {
        let parsed: OwCurrentResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            FetchError::Unparseable { provider: "openweather", reason: e.to_string() }
        })?;
        normalize(parsed, raw)
    }

    #[test]
    fn normalizes_current_weather() {
        let raw = json!({
            "name": "Philadelphia",
            "main": {"temp": 72.5, "feels_like": 70.1, "humidity": 40, "pressure": 1015},
            "weather": [{"description": "clear sky", "main": "Clear"}]
        });

        let reading = parse(raw.clone()).unwrap();
        assert_eq!(reading.temperature_f, 72.5);
        assert_eq!(reading.feels_like_f, 70.1);
        assert_eq!(reading.humidity_pct, 40);
        assert_eq!(reading.condition_text, "clear sky");
        assert_eq!(reading.raw, raw);
    }

    #[test]
    fn empty_weather_array_is_unparseable() {
        let raw = json!({
            "main": {"temp": 50.0, "feels_like": 48.0, "humidity": 80},
            "weather": []
        });
        assert!(matches!(parse(raw), Err(FetchError::Unparseable { .. })));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let provider = OpenWeatherProvider::new("super-secret".into());
        let dbg = format!("{provider:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("redacted"));
    }
}
