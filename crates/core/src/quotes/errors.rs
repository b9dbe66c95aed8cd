//! Market-data error types.

use thiserror::Error;

/// Errors that can occur while fetching or caching market data.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No data found")]
    NoData,
}

impl MarketDataError {
    /// Returns true if this error is transient and the batch should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarketDataError::NetworkError(_)
                | MarketDataError::RateLimitExceeded(_)
                | MarketDataError::ProviderError(_)
        )
    }
}
