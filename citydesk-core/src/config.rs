use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use crate::provider::ProviderId;

/// Environment variables recognized on top of the config file.
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_AGENT_MODEL: &str = "AGENT_MODEL";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

fn default_fetch_timeout_secs() -> u64 {
    5
}

fn default_agent_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration for a single weather provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Top-level configuration stored on disk.
///
/// Constructed once at startup and passed by reference into the services;
/// business logic never reads the environment directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Upper bound on a single live fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Model identifier handed to the hosting agent framework.
    #[serde(default = "default_agent_model")]
    pub agent_model: String,

    /// Log verbosity, overridable via `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            agent_model: default_agent_model(),
            log_level: default_log_level(),
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `citydesk configure <provider>` (e.g. `citydesk configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Load config from disk and apply environment overrides.
    ///
    /// A missing config file is not an error; a missing weather credential is
    /// a normal condition handled by the mock fallback, not a startup failure.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "citydesk", "citydesk")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
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

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_WEATHER_API_KEY).ok(),
            std::env::var(ENV_AGENT_MODEL).ok(),
            std::env::var(ENV_LOG_LEVEL).ok(),
        );
    }

    /// Apply override values on top of whatever the file provided.
    ///
    /// The API key lands on the default provider, or on OpenWeather when no
    /// default has been chosen yet.
    fn apply_overrides(
        &mut self,
        api_key: Option<String>,
        agent_model: Option<String>,
        log_level: Option<String>,
    ) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let id = self.default_provider_id().unwrap_or(ProviderId::OpenWeather);
            self.upsert_provider_api_key(id, key);
        }
        if let Some(model) = agent_model.filter(|m| !m.is_empty()) {
            self.agent_model = model;
        }
        if let Some(level) = log_level.filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
    }
}
