//! Price storage traits.
//!
//! These traits abstract the persistence layer so different backends
//! (SQLite, in-memory) can be used interchangeably. Mutations are async
//! because they may go through a serialized write path; queries are sync.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::model::{CachedPrice, PriceBar, SymbolMetadata};
use crate::errors::{DatabaseError, Result};

/// Storage interface for the price-history cache.
///
/// # Contract
///
/// - `upsert_bars` is idempotent: a bar for an existing `(symbol, date)`
///   replaces the stored row, and re-upserting identical data changes
///   nothing observable.
/// - Every successful upsert refreshes the symbol's [`SymbolMetadata`]
///   (first/last date, record count, last_updated).
/// - Range queries return bars ordered by ascending date.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Upserts a batch of bars and refreshes metadata for affected symbols.
    ///
    /// Returns the number of rows written.
    async fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize>;

    /// Deletes all bars and metadata for a symbol (force-refresh support).
    ///
    /// Returns the number of bars deleted.
    async fn delete_symbol(&self, symbol: &str) -> Result<usize>;

    /// Most recent bar for a symbol, if any.
    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>>;

    /// Most recent bar with `date <= as_of`.
    fn bar_on_or_before(&self, symbol: &str, as_of: NaiveDate) -> Result<Option<PriceBar>>;

    /// Bars within `[start, end]`, ascending by date.
    fn bars_in_range(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PriceBar>>;

    /// Coverage metadata for a symbol, if the symbol has any cached bars.
    fn metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>>;

    /// Coverage metadata for all cached symbols.
    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>>;
}

/// Resolves a valuation price from the cache with last-known fallback.
///
/// Returns the close of the latest bar with `date <= as_of`. When no such
/// bar exists but the symbol has later data, the earliest available bar is
/// returned flagged `stale` so callers can surface the approximation
/// instead of failing the whole aggregation.
pub fn resolve_price<S: PriceStore + ?Sized>(
    store: &S,
    symbol: &str,
    as_of: NaiveDate,
) -> Result<Option<CachedPrice>> {
    if let Some(bar) = store.bar_on_or_before(symbol, as_of)? {
        // A close older than a few sessions is still usable but flagged.
        let stale = (as_of - bar.date).num_days() > 7;
        return Ok(Some(CachedPrice {
            symbol: symbol.to_string(),
            date: bar.date,
            price: bar.close,
            stale,
        }));
    }
    match store.latest_bar(symbol)? {
        Some(bar) => Ok(Some(CachedPrice {
            symbol: symbol.to_string(),
            date: bar.date,
            price: bar.close,
            stale: true,
        })),
        None => Ok(None),
    }
}

/// In-memory [`PriceStore`] backed by per-symbol `BTreeMap`s.
///
/// Used by tests and by embedders that do not need durability. The SQLite
/// implementation lives in the `fundfolio-storage-sqlite` crate.
#[derive(Default)]
pub struct MemoryPriceStore {
    bars: RwLock<BTreeMap<String, BTreeMap<NaiveDate, PriceBar>>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, BTreeMap<NaiveDate, PriceBar>>>>
    {
        self.bars
            .read()
            .map_err(|e| DatabaseError::Internal(e.to_string()).into())
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize> {
        let mut guard = self
            .bars
            .write()
            .map_err(|e| DatabaseError::Internal(e.to_string()))?;
        for bar in bars {
            guard
                .entry(bar.symbol.clone())
                .or_default()
                .insert(bar.date, bar.clone());
        }
        Ok(bars.len())
    }

    async fn delete_symbol(&self, symbol: &str) -> Result<usize> {
        let mut guard = self
            .bars
            .write()
            .map_err(|e| DatabaseError::Internal(e.to_string()))?;
        Ok(guard.remove(symbol).map(|m| m.len()).unwrap_or(0))
    }

    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>> {
        let guard = self.read_guard()?;
        Ok(guard
            .get(symbol)
            .and_then(|m| m.values().next_back().cloned()))
    }

    fn bar_on_or_before(&self, symbol: &str, as_of: NaiveDate) -> Result<Option<PriceBar>> {
        let guard = self.read_guard()?;
        Ok(guard
            .get(symbol)
            .and_then(|m| m.range(..=as_of).next_back().map(|(_, b)| b.clone())))
    }

    fn bars_in_range(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let guard = self.read_guard()?;
        Ok(guard
            .get(symbol)
            .map(|m| m.range(start..=end).map(|(_, b)| b.clone()).collect())
            .unwrap_or_default())
    }

    fn metadata(&self, symbol: &str) -> Result<Option<SymbolMetadata>> {
        let guard = self.read_guard()?;
        Ok(guard.get(symbol).and_then(|m| {
            let first = m.keys().next()?;
            let last = m.keys().next_back()?;
            Some(SymbolMetadata {
                symbol: symbol.to_string(),
                first_date: *first,
                last_date: *last,
                last_updated: Utc::now(),
                total_records: m.len() as i64,
            })
        }))
    }

    fn all_metadata(&self) -> Result<Vec<SymbolMetadata>> {
        let guard = self.read_guard()?;
        let symbols: Vec<String> = guard.keys().cloned().collect();
        drop(guard);
        let mut out = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(meta) = self.metadata(&symbol)? {
                out.push(meta);
            }
        }
        Ok(out)
    }
}
