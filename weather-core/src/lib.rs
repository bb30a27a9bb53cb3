//! Core library for the `weather-dashboard` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Weather providers, one per response shape (current weather, forecast)
//! - Snapshot persistence to object storage
//! - The sequential fetch → store pipeline
//!
//! It is used by `weather-dashboard-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;

pub use config::{Config, ProviderConfig, StorageConfig};
pub use error::{FetchError, StoreError};
pub use model::{CityName, Snapshot, WeatherReading};
pub use pipeline::{CityOutcome, CityStatus, PipelineRunner, RunResult};
pub use provider::{ProviderId, WeatherProvider};
pub use store::{ObjectStore, SnapshotStore};
