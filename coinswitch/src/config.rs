//! Configuration management for coinswitch.
//!
//! Configuration is a single JSON document naming the coins to consider and
//! the selection settings. It is read once at startup.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::coin::Coin;
use crate::error::{Error, Result};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "COINSWITCH_CONFIG";

/// Configuration file used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/coinswitch/coinswitch.json";

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Score divisor for coins on a different algorithm than the active
    /// coin. 0 or 1 disables the penalty; values between them are rejected.
    #[serde(default = "default_algo_switch_multiplier")]
    pub algo_switch_multiplier: f64,

    /// Seconds between selection rounds
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Symbol of the coin mined at startup
    #[serde(default)]
    pub active_coin: Option<String>,

    /// Per-request HTTP timeout; unset means wait indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    pub coins: Vec<CoinConfig>,
}

/// One coin entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinConfig {
    pub symbol: String,

    /// Display name; defaults to the symbol
    #[serde(default)]
    pub name: Option<String>,

    /// Mining algorithm identifier
    pub algo: String,

    /// Wallet address or pool login
    pub login: String,

    /// Pool stratum URL
    #[serde(default)]
    pub url: Option<String>,

    /// Base URL of the pool statistics API
    #[serde(default)]
    pub api: Option<String>,

    #[serde(default)]
    pub ticker: Option<TickerConfig>,

    /// This miner's hashrate on the coin's algorithm
    #[serde(default)]
    pub hashrate: f64,

    /// Atomic units per coin, if the pool does not announce it
    #[serde(default)]
    pub coinunit: Option<f64>,

    /// Pin the statistics dialect instead of detecting it
    #[serde(default)]
    pub api_type: Option<String>,
}

/// Price ticker endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickerConfig {
    #[serde(default)]
    pub apibaseurl: Option<String>,

    /// Dotted path of the price field in the response
    #[serde(default)]
    pub jsonpath: String,

    /// Trading pair path appended to `apibaseurl`
    #[serde(default)]
    pub marketname: Option<String>,
}

fn default_algo_switch_multiplier() -> f64 {
    1.0
}

fn default_refresh_interval_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from `$COINSWITCH_CONFIG`, or the default path.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse and validate configuration text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.coins.is_empty() {
            return Err(Error::Config("no coins configured".into()));
        }

        let mut seen = HashSet::new();
        for coin in &self.coins {
            if coin.symbol.is_empty() {
                return Err(Error::Config("coin with empty symbol".into()));
            }
            if !seen.insert(coin.symbol.as_str()) {
                return Err(Error::Config(format!("duplicate coin {}", coin.symbol)));
            }
            if coin.coinunit.is_some_and(|u| u <= 0.0) {
                return Err(Error::Config(format!(
                    "coin {}: coinunit must be positive",
                    coin.symbol
                )));
            }
        }

        if !(self.algo_switch_multiplier >= 0.0 && self.algo_switch_multiplier.is_finite()) {
            return Err(Error::Config(format!(
                "algo_switch_multiplier must be a non-negative number, got {}",
                self.algo_switch_multiplier
            )));
        }
        if self.algo_switch_multiplier > 0.0 && self.algo_switch_multiplier < 1.0 {
            // Below 1 would favor switching algorithms instead of penalizing it.
            return Err(Error::Config(format!(
                "algo_switch_multiplier must be 0 or at least 1, got {}",
                self.algo_switch_multiplier
            )));
        }

        if self.refresh_interval_secs == 0 {
            return Err(Error::Config("refresh_interval_secs must be non-zero".into()));
        }

        if let Some(active) = &self.active_coin {
            if !seen.contains(active.as_str()) {
                return Err(Error::Config(format!(
                    "active_coin {} is not a configured coin",
                    active
                )));
            }
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Build the coin set described by this configuration.
    pub fn build_coins(&self) -> Result<Vec<Coin>> {
        self.coins.iter().cloned().map(Coin::from_config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::ApiType;
    use crate::dialect::Dialect;

    const EXAMPLE: &str = r#"{
        "algo_switch_multiplier": 1.25,
        "active_coin": "XMR",
        "request_timeout_secs": 15,
        "coins": [
            {
                "symbol": "XMR",
                "name": "Monero",
                "algo": "rx/0",
                "login": "44Affq5kSiGBoZ",
                "url": "stratum+tcp://pool.example:3333",
                "api": "https://pool.example/api",
                "ticker": {
                    "apibaseurl": "https://ticker.example/api/v2/ticker",
                    "jsonpath": "last",
                    "marketname": "xmr_btc"
                },
                "hashrate": 5200
            },
            {
                "symbol": "MSR",
                "algo": "cn-half",
                "login": "5t5mEm254JNJ9HqRjY",
                "api": "https://msr.example/api",
                "api_type": "fairpool"
            }
        ]
    }"#;

    #[test]
    fn test_parse_example() {
        let config = Config::from_json(EXAMPLE).unwrap();

        assert_eq!(config.algo_switch_multiplier, 1.25);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.active_coin.as_deref(), Some("XMR"));

        let coins = config.build_coins().unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].name, "Monero");
        assert_eq!(coins[0].hashrate, 5200.0);
        assert!(coins[0].ticker.is_configured());
        assert_eq!(coins[0].network.api_type(), ApiType::Unresolved);
        assert!(!coins[1].ticker.is_configured());
        assert_eq!(coins[1].network.api_type(), ApiType::Resolved(Dialect::Fairpool));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_json(
            r#"{"coins": [{"symbol": "A", "algo": "x", "login": "w"}]}"#,
        )
        .unwrap();

        assert_eq!(config.algo_switch_multiplier, 1.0);
        assert_eq!(config.refresh_interval_secs, 30);
        assert!(config.active_coin.is_none());
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_rejects_duplicate_symbols() {
        let err = Config::from_json(
            r#"{"coins": [
                {"symbol": "A", "algo": "x", "login": "w"},
                {"symbol": "A", "algo": "y", "login": "w"}
            ]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate coin A"));
    }

    #[test]
    fn test_rejects_unknown_active_coin() {
        let err = Config::from_json(
            r#"{"active_coin": "B", "coins": [{"symbol": "A", "algo": "x", "login": "w"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_negative_multiplier() {
        let err = Config::from_json(
            r#"{"algo_switch_multiplier": -1, "coins": [{"symbol": "A", "algo": "x", "login": "w"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_fractional_multiplier() {
        let err = Config::from_json(
            r#"{"algo_switch_multiplier": 0.5, "coins": [{"symbol": "A", "algo": "x", "login": "w"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("0 or at least 1"));

        let config = Config::from_json(
            r#"{"algo_switch_multiplier": 0, "coins": [{"symbol": "A", "algo": "x", "login": "w"}]}"#,
        )
        .unwrap();
        assert_eq!(config.algo_switch_multiplier, 0.0);
    }

    #[test]
    fn test_rejects_empty_coin_list() {
        assert!(matches!(
            Config::from_json(r#"{"coins": []}"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rejects_missing_algo() {
        let err = Config::from_json(r#"{"coins": [{"symbol": "A", "login": "w"}]}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/coinswitch.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
