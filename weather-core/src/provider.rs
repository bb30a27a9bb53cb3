use crate::{
    CityName, Config, FetchError, WeatherReading,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherapi;

/// Which provider (and therefore which response shape) a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// OpenWeather current-weather endpoint.
    OpenWeather,
    /// WeatherAPI.com multi-day forecast endpoint.
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi]
    }

    /// Environment variable that carries this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
            ProviderId::WeatherApi => "WEATHER_FORECAST_API_KEY",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, weatherapi."
            )),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::try_from(s)
    }
}

/// Fetches one normalized reading per call. Implementations never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, city: &CityName) -> Result<WeatherReading, FetchError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: set {} or run `weather-dashboard configure {id}`.",
            id.api_key_env()
        )
    })?;

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(api_key.to_owned())),
        ProviderId::WeatherApi => Box::new(WeatherApiProvider::new(api_key.to_owned())),
    };

    Ok(boxed)
}

/// GET `url` and decode the body twice: once as an untyped value kept for
/// storage, once into the adapter's schema.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    provider: ProviderId,
    url: &str,
    query: &[(&str, &str)],
) -> Result<(T, Value), FetchError> {
    let name = provider.as_str();

    // The query carries the API key, so transport errors drop the URL.
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| FetchError::Transport { provider: name, source: source.without_url() })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| FetchError::Transport { provider: name, source: source.without_url() })?;

    if !status.is_success() {
        return Err(FetchError::UpstreamStatus {
            provider: name,
            code: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    let raw: Value = serde_json::from_str(&body).map_err(|e| FetchError::Unparseable {
        provider: name,
        reason: format!("body is not JSON: {e}"),
    })?;

    let parsed = serde_json::from_value::<T>(raw.clone()).map_err(|e| FetchError::Unparseable {
        provider: name,
        reason: e.to_string(),
    })?;

    Ok((parsed, raw))
}

/// Join a base URL and an endpoint path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_parse_is_case_insensitive() {
        assert_eq!("OpenWeather".parse::<ProviderId>().unwrap(), ProviderId::OpenWeather);
        assert_eq!("WEATHERAPI".parse::<ProviderId>().unwrap(), ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No API key configured for provider"));
        assert!(msg.contains("OPENWEATHER_API_KEY"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://x/", "/data/2.5/weather"), "http://x/data/2.5/weather");
        assert_eq!(endpoint("http://x", "v1/forecast.json"), "http://x/v1/forecast.json");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let short = "not found";
        assert_eq!(truncate_body(short), short);

        let long = "é".repeat(250);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
