//! Sequential fetch → store loop over a list of cities.

use chrono::{DateTime, Utc};

use crate::{
    CityName, FetchError, StoreError, WeatherProvider, WeatherReading,
    store::{SavedSnapshot, SnapshotStore},
};

/// Message reported when a run finishes, whatever the per-city outcomes were.
pub const COMPLETION_MESSAGE: &str = "Weather data collected successfully";

/// Terminal state of one city after a single pass.
#[derive(Debug)]
pub enum CityStatus {
    Stored { reading: WeatherReading, key: String, captured_at: DateTime<Utc> },
    /// Fetched with persistence switched off.
    Fetched { reading: WeatherReading },
    FetchFailed { error: FetchError },
    /// The reading is kept so the caller can still report or chart it.
    StoreFailed { reading: WeatherReading, error: StoreError },
}

impl CityStatus {
    pub fn reading(&self) -> Option<&WeatherReading> {
        match self {
            Self::Stored { reading, .. }
            | Self::Fetched { reading }
            | Self::StoreFailed { reading, .. } => Some(reading),
            Self::FetchFailed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored { .. } | Self::Fetched { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stored { .. } => "fetched+stored",
            Self::Fetched { .. } => "fetched",
            Self::FetchFailed { .. } => "fetch-failed",
            Self::StoreFailed { .. } => "store-failed",
        }
    }
}

#[derive(Debug)]
pub struct CityOutcome {
    pub city: CityName,
    pub status: CityStatus,
}

/// Per-city outcomes in input order.
#[derive(Debug, Default)]
pub struct RunResult {
    pub outcomes: Vec<CityOutcome>,
}

impl RunResult {
    /// Always [`COMPLETION_MESSAGE`]; see [`RunResult::summary`] for counts.
    pub fn message(&self) -> &'static str {
        COMPLETION_MESSAGE
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_success())
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.status.is_success()).count()
    }

    fn count(&self, label: &str) -> usize {
        self.outcomes.iter().filter(|o| o.status.label() == label).count()
    }

    /// e.g. `3 cities: 1 stored, 0 fetched, 1 fetch failed, 1 store failed`
    pub fn summary(&self) -> String {
        format!(
            "{} cities: {} stored, {} fetched, {} fetch failed, {} store failed",
            self.outcomes.len(),
            self.count("fetched+stored"),
            self.count("fetched"),
            self.count("fetch-failed"),
            self.count("store-failed"),
        )
    }
}

/// Drives one fetch per city and, when a store is attached, one save per
/// successful fetch.
pub struct PipelineRunner<'a> {
    provider: &'a dyn WeatherProvider,
    store: Option<&'a SnapshotStore>,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(provider: &'a dyn WeatherProvider) -> Self {
        Self { provider, store: None }
    }

    pub fn with_store(mut self, store: &'a SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn run(&self, cities: &[CityName]) -> RunResult {
        let mut result = RunResult { outcomes: Vec::with_capacity(cities.len()) };

        tracing::info!(
            provider = %self.provider.id(),
            cities = cities.len(),
            persist = self.store.is_some(),
            "starting run"
        );

        for city in cities {
            let status = self.process(city).await;
            result.outcomes.push(CityOutcome { city: city.clone(), status });
        }

        tracing::info!(summary = %result.summary(), "{}", result.message());
        result
    }

    async fn process(&self, city: &CityName) -> CityStatus {
        tracing::info!(%city, "fetching weather");

        let reading = match self.provider.fetch(city).await {
            Ok(reading) => reading,
            Err(error) => {
                tracing::warn!(%city, kind = error.kind(), %error, "fetch failed");
                return CityStatus::FetchFailed { error };
            }
        };

        tracing::info!(
            %city,
            temperature_f = reading.temperature_f,
            feels_like_f = reading.feels_like_f,
            humidity_pct = reading.humidity_pct,
            condition = %reading.condition_text,
            "fetched reading"
        );

        let Some(store) = self.store else {
            return CityStatus::Fetched { reading };
        };

        match store.save(&reading, city).await {
            Ok(SavedSnapshot { key, captured_at }) => CityStatus::Stored { reading, key, captured_at },
            Err(error) => {
                tracing::warn!(%city, kind = error.kind(), %error, "store failed");
                CityStatus::StoreFailed { reading, error }
            }
        }
    }
}
