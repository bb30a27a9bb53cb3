use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

use crate::provider::ProviderId;

/// Format used for the `timestamp` field and the object key suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Cities processed when nothing else is configured.
pub const DEFAULT_CITIES: [&str; 3] = ["Philadelphia", "Seattle", "New York"];

/// A caller-supplied city name, kept exactly as given. Only guaranteed to be
/// non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CityName(String);

impl CityName {
    pub fn new(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("City name must not be empty");
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a list of names, failing on the first blank entry.
    pub fn parse_all<I, S>(names: I) -> anyhow::Result<Vec<CityName>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().map(CityName::new).collect()
    }

    pub fn defaults() -> Vec<CityName> {
        DEFAULT_CITIES.iter().map(|c| CityName(c.to_string())).collect()
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CityName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CityName::new(value)
    }
}

impl From<CityName> for String {
    fn from(value: CityName) -> Self {
        value.0
    }
}

/// Normalized weather data extracted from one provider response.
///
/// Units are always imperial: degrees Fahrenheit and percent humidity.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    pub provider: ProviderId,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: u8,
    pub condition_text: String,
    /// Full provider payload, kept verbatim for storage.
    pub raw: Value,
}

/// A reading bound to a city and the moment the store wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub city: CityName,
    pub captured_at: DateTime<Utc>,
    pub reading: WeatherReading,
}

/// Normalized block injected into every stored document under `snapshot`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotHeader {
    city: CityName,
    captured_at: DateTime<Utc>,
    provider: String,
    temperature_f: f64,
    feels_like_f: f64,
    humidity_pct: u8,
    condition_text: String,
    #[serde(default)]
    wrapped_payload: bool,
}

const TIMESTAMP_FIELD: &str = "timestamp";
const HEADER_FIELD: &str = "snapshot";
const WRAPPED_PAYLOAD_FIELD: &str = "payload";

impl Snapshot {
    pub fn new(city: CityName, reading: WeatherReading, captured_at: DateTime<Utc>) -> Self {
        // Keys and the injected timestamp only carry whole seconds.
        let captured_at = truncate_to_seconds(captured_at);
        Self { city, captured_at, reading }
    }

    /// `YYYYMMDD-HHMMSS` rendering of the capture time.
    pub fn timestamp(&self) -> String {
        format_timestamp(self.captured_at)
    }

    /// Object key this snapshot is written under.
    pub fn storage_key(&self) -> String {
        format!("weather-data/{}-{}.json", self.city, self.timestamp())
    }

    /// Raw payload with the `timestamp` and `snapshot` fields injected.
    pub fn to_json(&self) -> Value {
        let (mut doc, wrapped) = match &self.reading.raw {
            Value::Object(map) => (map.clone(), false),
            other => {
                let mut map = Map::new();
                map.insert(WRAPPED_PAYLOAD_FIELD.to_string(), other.clone());
                (map, true)
            }
        };

        let header = json!({
            "city": self.city.as_str(),
            "capturedAt": self.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "provider": self.reading.provider.as_str(),
            "temperatureF": self.reading.temperature_f,
            "feelsLikeF": self.reading.feels_like_f,
            "humidityPct": self.reading.humidity_pct,
            "conditionText": self.reading.condition_text,
            "wrappedPayload": wrapped,
        });

        doc.insert(TIMESTAMP_FIELD.to_string(), Value::String(self.timestamp()));
        doc.insert(HEADER_FIELD.to_string(), header);

        Value::Object(doc)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.to_json())
    }

    /// Re-parse a stored document produced by [`Snapshot::to_json`].
    pub fn from_json(bytes: &[u8]) -> anyhow::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Object(mut doc) = value else {
            anyhow::bail!("Stored snapshot is not a JSON object");
        };

        let header = doc
            .remove(HEADER_FIELD)
            .ok_or_else(|| anyhow::anyhow!("Stored snapshot has no `{HEADER_FIELD}` field"))?;
        let header: SnapshotHeader = serde_json::from_value(header)?;

        let timestamp = doc
            .remove(TIMESTAMP_FIELD)
            .and_then(|v| v.as_str().map(str::to_owned))
            .ok_or_else(|| anyhow::anyhow!("Stored snapshot has no `{TIMESTAMP_FIELD}` field"))?;
        let stamped = parse_timestamp(&timestamp)?;
        if stamped != truncate_to_seconds(header.captured_at) {
            anyhow::bail!(
                "Snapshot timestamp {timestamp} disagrees with capturedAt {}",
                header.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            );
        }

        let raw = if header.wrapped_payload {
            doc.remove(WRAPPED_PAYLOAD_FIELD).unwrap_or(Value::Null)
        } else {
            Value::Object(doc)
        };

        let provider = ProviderId::try_from(header.provider.as_str())?;

        Ok(Snapshot {
            city: header.city,
            captured_at: header.captured_at,
            reading: WeatherReading {
                provider,
                temperature_f: header.temperature_f,
                feels_like_f: header.feels_like_f,
                humidity_pct: header.humidity_pct,
                condition_text: header.condition_text,
                raw,
            },
        })
    }
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| anyhow::anyhow!("Invalid snapshot timestamp '{s}': {e}"))?;
    Ok(naive.and_utc())
}

fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp(at.timestamp(), 0).unwrap_or(at)
}
