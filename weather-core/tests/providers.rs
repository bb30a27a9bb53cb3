//! Provider adapters against a mock HTTP server.

use serde_json::json;
use weather_core::{
    CityName, FetchError, ProviderId, WeatherProvider,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn city(name: &str) -> CityName {
    CityName::new(name).unwrap()
}

fn openweather_body() -> serde_json::Value {
    json!({
        "name": "Philadelphia",
        "dt": 1709967903,
        "main": {"temp": 72.5, "feels_like": 70.1, "humidity": 40},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky"}],
        "wind": {"speed": 4.6}
    })
}

#[tokio::test]
async fn openweather_sends_city_key_and_imperial_units() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Philadelphia"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openweather_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::new("test-key".into()).with_base_url(server.uri());
    let reading = provider.fetch(&city("Philadelphia")).await.unwrap();

    assert_eq!(reading.provider, ProviderId::OpenWeather);
    assert_eq!(reading.temperature_f, 72.5);
    assert_eq!(reading.feels_like_f, 70.1);
    assert_eq!(reading.humidity_pct, 40);
    assert_eq!(reading.condition_text, "clear sky");
    assert_eq!(reading.raw, openweather_body());
}

#[tokio::test]
async fn openweather_404_is_upstream_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Atlantis"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::new("k".into()).with_base_url(server.uri());
    let err = provider.fetch(&city("Atlantis")).await.unwrap_err();

    match err {
        FetchError::UpstreamStatus { code, body, .. } => {
            assert_eq!(code, 404);
            assert!(body.contains("city not found"));
        }
        other => panic!("expected UpstreamStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_fields_are_unparseable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Nowhere"})))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::new("k".into()).with_base_url(server.uri());
    let err = provider.fetch(&city("Nowhere")).await.unwrap_err();
    assert!(matches!(err, FetchError::Unparseable { .. }), "got {err:?}");
}

#[tokio::test]
async fn non_json_body_is_unparseable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let provider = OpenWeatherProvider::new("k".into()).with_base_url(server.uri());
    let err = provider.fetch(&city("Oslo")).await.unwrap_err();
    assert!(matches!(err, FetchError::Unparseable { .. }), "got {err:?}");
}

#[tokio::test]
async fn connection_refused_is_transport() {
    // Nothing listens on the discard port.
    let provider = OpenWeatherProvider::new("k".into()).with_base_url("http://127.0.0.1:9");
    let err = provider.fetch(&city("Oslo")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
    assert_eq!(err.kind(), "transport");
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = format!("{err} {err:?}");
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!(" {cause} {cause:?}"));
        source = cause.source();
    }
    text
}

#[tokio::test]
async fn transport_error_does_not_expose_api_key() {
    let provider =
        OpenWeatherProvider::new("SECRET-KEY-123".into()).with_base_url("http://127.0.0.1:9");
    let err = provider.fetch(&city("Oslo")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
    assert!(!error_chain(&err).contains("SECRET-KEY-123"), "key leaked: {err}");

    let provider =
        WeatherApiProvider::new("SECRET-KEY-456".into()).with_base_url("http://127.0.0.1:9");
    let err = provider.fetch(&city("Oslo")).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
    assert!(!error_chain(&err).contains("SECRET-KEY-456"), "key leaked: {err}");
}

#[tokio::test]
async fn weatherapi_requests_three_day_forecast() {
    let server = MockServer::start().await;

    let body = json!({
        "location": {"name": "Seattle", "country": "United States of America"},
        "current": {
            "temp_f": 53.6,
            "feelslike_f": 50.0,
            "humidity": 87,
            "condition": {"text": "Light rain"}
        },
        "forecast": {"forecastday": [
            {"date": "2024-03-09"}, {"date": "2024-03-10"}, {"date": "2024-03-11"}
        ]}
    });

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .and(query_param("key", "wa-key"))
        .and(query_param("q", "Seattle"))
        .and(query_param("days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = WeatherApiProvider::new("wa-key".into()).with_base_url(server.uri());
    let reading = provider.fetch(&city("Seattle")).await.unwrap();

    assert_eq!(reading.provider, ProviderId::WeatherApi);
    assert_eq!(reading.temperature_f, 53.6);
    assert_eq!(reading.humidity_pct, 87);
    assert_eq!(reading.condition_text, "Light rain");
    assert_eq!(reading.raw, body);
}

#[tokio::test]
async fn weatherapi_bad_location_is_upstream_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 1006, "message": "No matching location found."}
        })))
        .mount(&server)
        .await;

    let provider = WeatherApiProvider::new("k".into()).with_base_url(server.uri());
    let err = provider.fetch(&city("Atlantis")).await.unwrap_err();
    assert_eq!(err.status_code(), Some(400));
}
