use thiserror::Error;

/// Custom error types for the optionchain-rs library
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("option chain data cannot be empty")]
    EmptyChain,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("no strikes available for ATM lookup")]
    NoStrikes,

    #[error("no option chain loaded; call analyze() first")]
    NoChain,

    #[error("fetch error: {0}")]
    FetchError(String),

    #[error("plot error: {0}")]
    PlotError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;
