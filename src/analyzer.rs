use crate::api::NseClient;
use crate::config::Config;
use crate::error::{ChainError, Result};
use crate::models::OptionChain;
use crate::utils::{plot_open_interest, plot_term_structure, plot_volatility_skew};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Cutoff applied when grouping for the exploratory charts, matching the
/// default used by the analytics operations.
const PLOT_OI_CUTOFF: u64 = 50;

/// Scalar statistics for one analyzed chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    pub symbol: String,
    pub underlying_price: f64,
    pub atm_strike: f64,
    pub total_records: usize,
    pub expiries_count: usize,
    pub strikes_count: usize,
    pub total_call_oi: u64,
    pub total_put_oi: u64,
    pub max_call_oi_strike: f64,
    pub max_put_oi_strike: f64,
}

/// Compute summary statistics for a chain.
pub fn summarize(chain: &OptionChain) -> Result<ChainSummary> {
    let max_call = chain
        .records
        .iter()
        .max_by_key(|r| r.call_oi)
        .ok_or(ChainError::EmptyChain)?;
    let max_put = chain
        .records
        .iter()
        .max_by_key(|r| r.put_oi)
        .ok_or(ChainError::EmptyChain)?;

    Ok(ChainSummary {
        symbol: chain.symbol.clone(),
        underlying_price: chain.underlying_price,
        atm_strike: chain.get_atm_strike()?,
        total_records: chain.records.len(),
        expiries_count: chain.expiries.len(),
        strikes_count: chain.strikes.len(),
        total_call_oi: chain.records.iter().map(|r| r.call_oi).sum(),
        total_put_oi: chain.records.iter().map(|r| r.put_oi).sum(),
        max_call_oi_strike: max_call.strike,
        max_put_oi_strike: max_put.strike,
    })
}

/// Facade orchestrating fetch, parse, filter, and chart rendering for one
/// symbol at a time. Each `analyze` call is independent; a failure for one
/// symbol never takes the process down.
pub struct ChainAnalyzer {
    client: NseClient,
    current_chain: Option<OptionChain>,
}

impl ChainAnalyzer {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: NseClient::new(config.nse.clone())?,
            current_chain: None,
        })
    }

    /// Fetch, parse, and OI-filter the chain for a symbol. The filtered
    /// chain is kept for the chart entry points and returned to the caller.
    pub async fn analyze(&mut self, symbol: &str, oi_cutoff: u64) -> Result<OptionChain> {
        let chain = self.client.fetch_option_chain(symbol).await?;

        info!("underlying price: {:.2}", chain.underlying_price);
        info!("ATM strike: {:.2}", chain.get_atm_strike()?);
        info!(
            "available expiries: {}, strikes: {}",
            chain.expiries.len(),
            chain.strikes.len()
        );

        let filtered = chain.filter_by_oi(oi_cutoff);
        info!(
            "after OI filter ({}): {} records",
            oi_cutoff,
            filtered.records.len()
        );

        self.current_chain = Some(filtered.clone());
        Ok(filtered)
    }

    pub fn current_chain(&self) -> Option<&OptionChain> {
        self.current_chain.as_ref()
    }

    /// Summary statistics for the most recently analyzed chain.
    pub fn summary(&self) -> Result<ChainSummary> {
        let chain = self.current_chain.as_ref().ok_or(ChainError::NoChain)?;
        summarize(chain)
    }

    /// Render the volatility skew for one expiry (0 = nearest).
    pub fn plot_volatility_skew<P: AsRef<Path>>(
        &self,
        expiry_index: usize,
        output_path: P,
    ) -> Result<()> {
        let chain = self.current_chain.as_ref().ok_or(ChainError::NoChain)?;
        let groups = chain.group_by_expiry(PLOT_OI_CUTOFF);
        let rows = groups.get(&expiry_index).ok_or_else(|| {
            ChainError::PlotError(format!("expiry index {} out of range", expiry_index))
        })?;
        let title = format!(
            "{} - Volatility Skew ({})",
            chain.symbol, chain.expiries[expiry_index]
        );
        plot_volatility_skew(rows, chain.underlying_price, &title, output_path)
    }

    /// Render the IV term structure for a strike (defaults to ATM).
    pub fn plot_term_structure<P: AsRef<Path>>(
        &self,
        strike: Option<f64>,
        output_path: P,
    ) -> Result<()> {
        let chain = self.current_chain.as_ref().ok_or(ChainError::NoChain)?;
        let strike = match strike {
            Some(s) => s,
            None => chain.get_atm_strike()?,
        };

        let groups = chain.group_by_strike(PLOT_OI_CUTOFF);
        let rows = groups
            .iter()
            .find(|(s, _)| *s == strike)
            .map(|(_, rows)| rows)
            .ok_or_else(|| {
                ChainError::PlotError(format!("no traded rows at strike {}", strike))
            })?;
        let title = format!("{} - Term Structure (Strike: {})", chain.symbol, strike);
        plot_term_structure(rows, &title, output_path)
    }

    /// Render the open-interest distribution for one expiry (0 = nearest).
    pub fn plot_open_interest<P: AsRef<Path>>(
        &self,
        expiry_index: usize,
        output_path: P,
    ) -> Result<()> {
        let chain = self.current_chain.as_ref().ok_or(ChainError::NoChain)?;
        let groups = chain.group_by_expiry(PLOT_OI_CUTOFF);
        let rows = groups.get(&expiry_index).ok_or_else(|| {
            ChainError::PlotError(format!("expiry index {} out of range", expiry_index))
        })?;
        let title = format!(
            "{} - Open Interest ({})",
            chain.symbol, chain.expiries[expiry_index]
        );
        plot_open_interest(rows, chain.underlying_price, &title, output_path)
    }
}
