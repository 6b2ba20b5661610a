use crate::refresh::PersistenceMode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

/// Environment variable overriding `providers.exchange_rate.api_key`.
pub const EXCHANGE_RATE_KEY_ENV: &str = "GOLDWATCH_EXCHANGE_RATE_API_KEY";
/// Environment variable overriding `providers.metals.api_key`.
pub const METALS_KEY_ENV: &str = "GOLDWATCH_METALS_API_KEY";

const DEFAULT_EXCHANGE_RATE_URL: &str = "https://v6.exchangerate-api.com";
const DEFAULT_METALS_URL: &str = "https://api.metalpriceapi.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeRateProviderConfig {
    #[serde(default = "default_exchange_rate_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetalsProviderConfig {
    #[serde(default = "default_metals_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_exchange_rate_provider")]
    pub exchange_rate: ExchangeRateProviderConfig,
    #[serde(default = "default_metals_provider")]
    pub metals: MetalsProviderConfig,
}

fn default_exchange_rate_url() -> String {
    DEFAULT_EXCHANGE_RATE_URL.to_string()
}

fn default_metals_url() -> String {
    DEFAULT_METALS_URL.to_string()
}

fn default_exchange_rate_provider() -> ExchangeRateProviderConfig {
    ExchangeRateProviderConfig {
        base_url: default_exchange_rate_url(),
        api_key: String::new(),
    }
}

fn default_metals_provider() -> MetalsProviderConfig {
    MetalsProviderConfig {
        base_url: default_metals_url(),
        api_key: String::new(),
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchange_rate: default_exchange_rate_provider(),
            metals: default_metals_provider(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RefreshConfig {
    #[serde(default)]
    pub persistence: PersistenceMode,
    /// Period of the background refresh trigger; disabled when absent.
    pub schedule_secs: Option<u64>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            persistence: PersistenceMode::default(),
            schedule_secs: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Disk,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Target currency the exchange rate and gold price are quoted in.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_metal")]
    pub metal: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub storage: StorageKind,
    pub data_path: Option<String>,
}

fn default_currency() -> String {
    "EGP".to_string()
}

fn default_metal() -> String {
    "XAU".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            metal: default_metal(),
            providers: ProvidersConfig::default(),
            server: ServerConfig::default(),
            refresh: RefreshConfig::default(),
            storage: StorageKind::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "goldwatch", "goldwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "goldwatch", "goldwatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.apply_key_overrides(|name| std::env::var(name).ok());
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Replaces API keys with values from `lookup` (normally the process
    /// environment) when present and non-empty.
    pub fn apply_key_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(EXCHANGE_RATE_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using exchange rate API key from {EXCHANGE_RATE_KEY_ENV}");
            self.providers.exchange_rate.api_key = key;
        }
        if let Some(key) = lookup(METALS_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using metals API key from {METALS_KEY_ENV}");
            self.providers.metals.api_key = key;
        }
    }
}
