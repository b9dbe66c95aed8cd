//! Price-cache domain models.
//!
//! The cache stores daily OHLC bars keyed by `(symbol, date)` together with
//! per-symbol coverage metadata that drives incremental fetching.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A daily price bar for a financial instrument.
///
/// Primary key is `(symbol, date)`; upserting the same bar twice is a no-op.
/// `adj_close` is the split/dividend adjusted close. `dividend` and `split`
/// carry corporate-action events folded into the bar for their ex-date
/// (`0` / `1` when none occurred).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: Decimal,
    pub dividend: Decimal,
    pub split: Decimal,
}

/// Coverage metadata for one cached symbol.
///
/// Maintained by the store on every upsert. Sync planning reads this to
/// fetch only the date gap not already covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolMetadata {
    pub symbol: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub last_updated: DateTime<Utc>,
    pub total_records: i64,
}

/// A price resolved from the cache for valuation purposes.
///
/// `stale` is set when the bar is older than the requested as-of date and
/// was used as a last-known fallback (e.g. after a fetch failure or over a
/// market holiday gap longer than normal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedPrice {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: Decimal,
    pub stale: bool,
}

/// A monthly observation from an economic indexer series (IPCA, CDI, SELIC).
///
/// `value` is the monthly percentage as published (e.g. `0.53` for 0.53%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerObservation {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl PriceBar {
    /// Deterministic row identity, useful for logging and dedup checks.
    pub fn key(&self) -> (String, NaiveDate) {
        (self.symbol.clone(), self.date)
    }
}
