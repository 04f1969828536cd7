use crate::error::{ChainError, Result};
use dotenv::dotenv;
use serde::Deserialize;
use std::env;

/// Configuration for the NSE India endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct NseConfig {
    /// Base URL of the NSE website
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures (429/5xx)
    pub max_retries: u32,
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// NSE endpoint configuration
    pub nse: NseConfig,
    /// Log level
    pub log_level: String,
    /// Default open interest cutoff applied by `analyze`
    pub oi_cutoff: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let base_url =
            env::var("NSE_BASE_URL").unwrap_or_else(|_| "https://www.nseindia.com".to_string());

        let timeout_secs = match env::var("NSE_TIMEOUT_SECS") {
            Ok(v) => v.parse().map_err(|_| {
                ChainError::ConfigError(format!("NSE_TIMEOUT_SECS is not a number: {}", v))
            })?,
            Err(_) => 30,
        };

        let max_retries = match env::var("NSE_MAX_RETRIES") {
            Ok(v) => v.parse().map_err(|_| {
                ChainError::ConfigError(format!("NSE_MAX_RETRIES is not a number: {}", v))
            })?,
            Err(_) => 3,
        };

        let oi_cutoff = match env::var("OI_CUTOFF") {
            Ok(v) => v.parse().map_err(|_| {
                ChainError::ConfigError(format!("OI_CUTOFF is not a number: {}", v))
            })?,
            Err(_) => 100,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            nse: NseConfig {
                base_url,
                timeout_secs,
                max_retries,
            },
            log_level,
            oi_cutoff,
        })
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();

        Ok(())
    }
}
