//! Configuration management
//! Load console settings from .env / environment, or from a TOML file
//!
//! Created: 2026-10-19

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Backend base path used when CONSOLE_API_URL is not set
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8001/api";

/// Block explorer used for the deploy transaction link
pub const DEFAULT_EXPLORER_URL: &str = "https://basescan.org";

/// Console settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Base URL of the bot engine REST API (no trailing slash needed)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Reconciliation cadence
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Fixed ETH->USD factor for the profit card. Not a live price feed.
    #[serde(default = "default_usd_rate")]
    pub usd_rate: Decimal,
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    #[serde(default = "default_network_name")]
    pub network_name: String,
    /// Wallet JSON-RPC endpoint (http, ws or ipc). None = no wallet provider.
    #[serde(default)]
    pub wallet_rpc_url: Option<String>,
}

fn default_api_base_url() -> String { DEFAULT_API_BASE_URL.to_string() }
fn default_poll_interval_secs() -> u64 { 5 }
fn default_usd_rate() -> Decimal { Decimal::from(2500) }
fn default_explorer_url() -> String { DEFAULT_EXPLORER_URL.to_string() }
fn default_network_name() -> String { "Base Mainnet".to_string() }

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval_secs(),
            usd_rate: default_usd_rate(),
            explorer_url: default_explorer_url(),
            network_name: default_network_name(),
            wallet_rpc_url: None,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.usd_rate.is_sign_negative() {
            bail!("usd_rate must not be negative (got {})", self.usd_rate);
        }
        if self.api_base_url.trim().is_empty() {
            bail!("api_base_url must not be empty");
        }
        Ok(())
    }
}

/// Load configuration from the process environment (after reading `.env`)
pub fn load_config() -> Result<ConsoleConfig> {
    dotenv::dotenv().ok();
    config_from_env()
}

/// Load configuration from a specific env file (e.g., `.env.base`)
pub fn load_config_from_file(env_file: &str) -> Result<ConsoleConfig> {
    dotenv::from_filename(env_file)
        .with_context(|| format!("Failed to load env file: {}", env_file))?;
    config_from_env()
}

fn config_from_env() -> Result<ConsoleConfig> {
    let defaults = ConsoleConfig::default();

    let config = ConsoleConfig {
        api_base_url: env_or("CONSOLE_API_URL", defaults.api_base_url),
        poll_interval_secs: match std::env::var("POLL_INTERVAL_SECS") {
            Ok(v) => v.parse().context("POLL_INTERVAL_SECS must be an integer")?,
            Err(_) => defaults.poll_interval_secs,
        },
        usd_rate: match std::env::var("USD_RATE") {
            Ok(v) => Decimal::from_str(v.trim()).context("USD_RATE must be a decimal")?,
            Err(_) => defaults.usd_rate,
        },
        explorer_url: env_or("EXPLORER_URL", defaults.explorer_url),
        network_name: env_or("NETWORK_NAME", defaults.network_name),
        wallet_rpc_url: std::env::var("WALLET_RPC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty()),
    };

    config.validate()?;
    Ok(config)
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
api_base_url = "https://bot.example/api"
usd_rate = 3100.5
wallet_rpc_url = "http://127.0.0.1:1248"
"#;

        let config: ConsoleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api_base_url, "https://bot.example/api");
        assert_eq!(config.usd_rate, dec!(3100.5));
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.explorer_url, DEFAULT_EXPLORER_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval_and_negative_rate() {
        let config = ConsoleConfig {
            poll_interval_secs: 0,
            ..ConsoleConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ConsoleConfig {
            usd_rate: dec!(-1),
            ..ConsoleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_match_base_console() {
        let config = ConsoleConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.usd_rate, dec!(2500));
        assert_eq!(config.network_name, "Base Mainnet");
        assert!(config.wallet_rpc_url.is_none());
    }
}
