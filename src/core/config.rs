use crate::core::balance::{BalanceFilter, WalletBalance};
use crate::core::currency::DEFAULT_ICON_BASE_URL;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_PRICES_BASE_URL: &str = "https://interview.switcheo.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PricesProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retries() -> usize {
    2
}

impl Default for PricesProviderConfig {
    fn default() -> Self {
        PricesProviderConfig {
            base_url: DEFAULT_PRICES_BASE_URL.to_string(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IconsProviderConfig {
    pub base_url: String,
}

impl Default for IconsProviderConfig {
    fn default() -> Self {
        IconsProviderConfig {
            base_url: DEFAULT_ICON_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub prices: PricesProviderConfig,
    #[serde(default)]
    pub icons: IconsProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversionConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_quote_latency_ms")]
    pub quote_latency_ms: u64,
    /// Seconds before cached rates are fetched again. Unset keeps them for
    /// the lifetime of the process.
    pub rates_stale_after_secs: Option<u64>,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_quote_latency_ms() -> u64 {
    3000
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            debounce_ms: default_debounce_ms(),
            quote_latency_ms: default_quote_latency_ms(),
            rates_stale_after_secs: None,
        }
    }
}

impl ConversionConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn quote_latency(&self) -> Duration {
        Duration::from_millis(self.quote_latency_ms)
    }

    pub fn rates_stale_after(&self) -> Option<Duration> {
        self.rates_stale_after_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PopularConfig {
    #[serde(default = "default_popular_currencies")]
    pub currencies: Vec<String>,
    #[serde(default = "default_popular_latency_ms")]
    pub latency_ms: u64,
}

fn default_popular_currencies() -> Vec<String> {
    ["ETH", "USDC", "WBTC", "ATOM", "OSMO", "SWTH"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_popular_latency_ms() -> u64 {
    1000
}

impl Default for PopularConfig {
    fn default() -> Self {
        PopularConfig {
            currencies: default_popular_currencies(),
            latency_ms: default_popular_latency_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub balances: Vec<WalletBalance>,
    #[serde(default)]
    pub filter: BalanceFilter,
    /// USD prices that take precedence over the fetched rates.
    #[serde(default)]
    pub prices: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub popular: PopularConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// it does not exist yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxswap", "fxswap")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
