use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),

    #[error("Invalid currency pair: {0}")]
    InvalidCurrencyPair(String),

    #[error("Currency conversion error: {0}")]
    ConversionError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}
