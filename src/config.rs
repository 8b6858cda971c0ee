//! Configuration module for the market engine

use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::order::{SellRounding, SizingPolicy};
use crate::pool::DEEPBOOK_PRICE_SCALAR_EXPONENT;

/// Default config file looked up in the working directory
const DEFAULT_CONFIG_FILE: &str = "deepbook.toml";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// DeepBook indexer base URL
    pub indexer_endpoint: String,

    /// Pool traded by the terminal (e.g. "SUI_USDC")
    pub pool_name: String,

    /// Order book depth levels requested and kept per side
    pub depth_levels: usize,

    /// Polling intervals
    pub orderbook_poll_ms: u64,
    pub summary_poll_ms: u64,
    pub trades_poll_ms: u64,
    pub status_interval_secs: u64,

    /// Recent trades requested per poll
    pub trades_limit: usize,

    /// Pool registry staleness window
    pub pools_ttl_secs: u64,

    /// `log10` of the exchange's fixed-point price scalar
    pub price_scalar_exponent: u32,

    /// Share of a buy budget actually spent
    pub buy_haircut: Decimal,

    /// Floor sell sizes instead of rounding to the nearest lot
    pub floor_sell_size: bool,

    /// Base retry delay after a failed fetch
    pub reconnect_delay_ms: u64,

    /// Listen address for health, metrics and depth endpoints
    pub http_addr: String,
}

impl Config {
    /// Load configuration from `deepbook.toml` (or `DEEPBOOK_CONFIG`) and
    /// `DEEPBOOK_*` environment variables
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = env::var("DEEPBOOK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        Self::from_sources(Some(&path), true)
    }

    /// Build from an optional file, optionally overlaid by the environment
    pub fn from_sources(file: Option<&Path>, with_env: bool) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        if with_env {
            builder = builder.add_source(
                ::config::Environment::with_prefix("DEEPBOOK").try_parsing(true),
            );
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.pool_name.is_empty() {
            return Err(EngineError::ConfigError("pool_name must be set".to_string()));
        }
        if self.depth_levels == 0 {
            return Err(EngineError::ConfigError(
                "depth_levels must be positive".to_string(),
            ));
        }
        if self.orderbook_poll_ms == 0
            || self.summary_poll_ms == 0
            || self.trades_poll_ms == 0
            || self.status_interval_secs == 0
        {
            return Err(EngineError::ConfigError(
                "polling intervals must be positive".to_string(),
            ));
        }
        if self.trades_limit == 0 {
            return Err(EngineError::ConfigError(
                "trades_limit must be positive".to_string(),
            ));
        }
        if self.buy_haircut <= Decimal::ZERO || self.buy_haircut > Decimal::ONE {
            return Err(EngineError::ConfigError(format!(
                "buy_haircut {} must be in (0, 1]",
                self.buy_haircut
            )));
        }
        Ok(())
    }

    pub fn sizing_policy(&self) -> SizingPolicy {
        SizingPolicy {
            buy_haircut: self.buy_haircut,
            sell_rounding: if self.floor_sell_size {
                SellRounding::Floor
            } else {
                SellRounding::Nearest
            },
        }
    }

    pub fn orderbook_poll_interval(&self) -> Duration {
        Duration::from_millis(self.orderbook_poll_ms)
    }

    pub fn summary_poll_interval(&self) -> Duration {
        Duration::from_millis(self.summary_poll_ms)
    }

    pub fn trades_poll_interval(&self) -> Duration {
        Duration::from_millis(self.trades_poll_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn pools_ttl(&self) -> Duration {
        Duration::from_secs(self.pools_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indexer_endpoint: "https://deepbook-indexer.mainnet.mystenlabs.com".to_string(),
            pool_name: "SUI_USDC".to_string(),
            depth_levels: 30,
            orderbook_poll_ms: 500,
            summary_poll_ms: 1000,
            trades_poll_ms: 1000,
            status_interval_secs: 30,
            trades_limit: 50,
            pools_ttl_secs: 24 * 60 * 60,
            price_scalar_exponent: DEEPBOOK_PRICE_SCALAR_EXPONENT,
            buy_haircut: crate::order::sizing::DEFAULT_BUY_HAIRCUT,
            floor_sell_size: false,
            reconnect_delay_ms: 1000,
            http_addr: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::from_sources(None, false).unwrap();
        assert_eq!(config.pool_name, "SUI_USDC");
        assert_eq!(config.depth_levels, 30);
        assert_eq!(config.price_scalar_exponent, 9);
        assert_eq!(config.buy_haircut, dec!(0.99));
        assert_eq!(config.orderbook_poll_interval(), Duration::from_millis(500));
        assert_eq!(config.pools_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.trades_poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.trades_limit, 50);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let path = Path::new("/nonexistent/deepbook.toml");
        let config = Config::from_sources(Some(path), false).unwrap();
        assert_eq!(config.summary_poll_ms, 1000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = write_config(
            r#"
pool_name = "DEEP_USDC"
depth_levels = 50
orderbook_poll_ms = 1000
price_scalar_exponent = 12
floor_sell_size = true
"#,
        );
        let config = Config::from_sources(Some(file.path()), false).unwrap();
        assert_eq!(config.pool_name, "DEEP_USDC");
        assert_eq!(config.depth_levels, 50);
        assert_eq!(config.orderbook_poll_ms, 1000);
        assert_eq!(config.price_scalar_exponent, 12);
        assert_eq!(config.sizing_policy().sell_rounding, SellRounding::Floor);
        // untouched keys keep their defaults
        assert_eq!(config.reconnect_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config("depth_levels = 0\n");
        assert!(matches!(
            Config::from_sources(Some(file.path()), false),
            Err(EngineError::ConfigError(_))
        ));

        let file = write_config("trades_limit = 0\n");
        assert!(Config::from_sources(Some(file.path()), false).is_err());

        let file = write_config("buy_haircut = 1.5\n");
        assert!(Config::from_sources(Some(file.path()), false).is_err());
    }
}
