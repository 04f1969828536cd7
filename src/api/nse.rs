use crate::api::parse::parse_chain;
use crate::config::NseConfig;
use crate::error::{ChainError, Result};
use crate::models::OptionChain;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

static NSE_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut h = HeaderMap::new();
    h.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.99 Safari/537.36",
        ),
    );
    h.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    h.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.9"));
    h
});

/// A fetch attempt that did not produce a document, split by whether a
/// retry could help.
struct FetchFailure {
    retryable: bool,
    reason: String,
}

impl FetchFailure {
    fn transient(reason: String) -> Self {
        Self {
            retryable: true,
            reason,
        }
    }

    fn fatal(reason: String) -> Self {
        Self {
            retryable: false,
            reason,
        }
    }
}

/// Client for the NSE India option-chain endpoint.
///
/// NSE rejects bare API requests; the client keeps a cookie store and
/// performs a warm-up request against the site root to establish a session
/// before hitting the API. Transient failures (429/5xx, network errors) are
/// retried with linear backoff up to the configured attempt budget.
pub struct NseClient {
    client: reqwest::Client,
    config: NseConfig,
}

impl NseClient {
    pub fn new(config: NseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(NSE_HEADERS.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChainError::FetchError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch and parse the option chain for an index symbol.
    pub async fn fetch_option_chain(&self, symbol: &str) -> Result<OptionChain> {
        let symbol = symbol.to_uppercase();
        let url = format!(
            "{}/api/option-chain-indices?symbol={}",
            self.config.base_url, symbol
        );

        info!("fetching option chain for {}", symbol);
        self.warm_up().await?;
        let document = self.get_json_with_retry(&url).await?;
        parse_chain(&symbol, &document)
    }

    /// Hit the site root so the session cookies NSE requires are set.
    async fn warm_up(&self) -> Result<()> {
        debug!("warming up NSE session at {}", self.config.base_url);
        let resp = self
            .client
            .get(&self.config.base_url)
            .send()
            .await
            .map_err(|e| ChainError::FetchError(format!("warm-up request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(ChainError::FetchError(format!(
                "warm-up request returned status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn get_json_with_retry(&self, url: &str) -> Result<Value> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.get_json(url).await {
                Ok(document) => return Ok(document),
                Err(failure) if failure.retryable && attempt <= self.config.max_retries => {
                    let backoff = Duration::from_secs(attempt as u64);
                    warn!(
                        "attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.config.max_retries, failure.reason, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(failure) => return Err(ChainError::FetchError(failure.reason)),
            }
        }
    }

    async fn get_json(&self, url: &str) -> std::result::Result<Value, FetchFailure> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::transient(format!("request failed: {}", e)))?;

        let status = resp.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(FetchFailure::transient(format!(
                "server returned status {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(FetchFailure::fatal(format!(
                "server returned status {}",
                status
            )));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            return Err(FetchFailure::fatal(format!(
                "non-JSON response (content-type: {})",
                content_type
            )));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| FetchFailure::fatal(format!("failed to decode JSON body: {}", e)))
    }
}
