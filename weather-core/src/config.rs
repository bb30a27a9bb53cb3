use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{model::CityName, provider::ProviderId};

/// Region whose buckets are created without a location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";

pub const BUCKET_ENV: &str = "AWS_BUCKET_NAME";
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Configuration for a single provider (e.g., API key).
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig").field("api_key", &"<redacted>").finish()
    }
}

/// Where snapshots are written.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
}

/// Top-level configuration: the on-disk TOML file overlaid with the process
/// environment. Built once at startup and passed to whoever needs it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Cities fetched when none are given on the command line.
    #[serde(default)]
    pub cities: Vec<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "No default provider configured.\n\
                 Hint: run `weather-dashboard configure <provider>` (e.g. `weather-dashboard configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// File config overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from an environment lookup. Non-empty variables win over
    /// the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for id in ProviderId::all() {
            if let Some(key) = var(id.api_key_env()) {
                self.upsert_provider_api_key(*id, key);
            }
        }

        if let Some(bucket) = var(BUCKET_ENV) {
            self.storage.bucket = Some(bucket);
        }
        if let Some(region) = var(REGION_ENV) {
            self.storage.region = Some(region);
        }
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn bucket(&self) -> Result<&str> {
        self.storage.bucket.as_deref().ok_or_else(|| {
            anyhow!(
                "No storage bucket configured.\n\
                 Hint: set {BUCKET_ENV} or add `bucket` under [storage] in {}.",
                Self::config_file_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "the config file".to_string())
            )
        })
    }

    pub fn region(&self) -> &str {
        self.storage.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    /// Configured cities, or the built-in defaults when none are set.
    pub fn cities(&self) -> Result<Vec<CityName>> {
        if self.cities.is_empty() {
            return Ok(CityName::defaults());
        }
        CityName::parse_all(self.cities.iter().cloned()).context("Invalid entry in `cities`")
    }
}
