//! # optionchain-rs
//!
//! A client for NSE India option chain data with open-interest analytics
//! and exploratory volatility charts.
//!
//! ## Features
//!
//! - Async HTTP client with session warm-up and bounded retry against the
//!   NSE option-chain endpoint
//! - Normalization of the nested per-strike payload into flat records with
//!   zero-filled legs
//! - At-the-money lookup, open-interest filtering, and grouping by expiry
//!   or strike
//! - Volatility skew, term structure, and open-interest charts
//! - Environment-based configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use optionchain_rs::analyzer::ChainAnalyzer;
//! use optionchain_rs::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> optionchain_rs::error::Result<()> {
//!     // Load configuration from environment
//!     let config = Config::from_env()?;
//!     config.init_logging()?;
//!
//!     let mut analyzer = ChainAnalyzer::new(&config)?;
//!     let chain = analyzer.analyze("NIFTY", config.oi_cutoff).await?;
//!
//!     println!("ATM strike: {}", chain.get_atm_strike()?);
//!
//!     analyzer.plot_volatility_skew(0, "volatility_skew.png")?;
//!     analyzer.plot_term_structure(None, "term_structure.png")?;
//!     analyzer.plot_open_interest(0, "open_interest.png")?;
//!
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{summarize, ChainAnalyzer, ChainSummary};
pub use api::{parse_chain, NseClient};
pub use config::Config;
pub use error::{ChainError, Result};
pub use models::{ExpiryRow, OptionChain, OptionRecord, StrikeRow};
