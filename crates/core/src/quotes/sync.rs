//! Incremental price synchronization.
//!
//! The sync service keeps the local price cache current by fetching only the
//! date ranges a symbol does not already cover, in bounded windows with
//! retry and throttling. Each window is persisted as soon as it is fetched,
//! so a failure mid-sync never loses the progress already made.

use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::client::MarketDataGateway;
use super::constants::{
    DEFAULT_BATCH_DAYS, INTER_BATCH_DELAY_MS, INTER_SYMBOL_DELAY_MS, MAX_FETCH_ATTEMPTS,
    RETRY_BASE_DELAY_MS,
};
use super::model::SymbolMetadata;
use super::store::PriceStore;
use crate::errors::Result;

/// One contiguous date span to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A fetch window that could not be filled after all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWindow {
    pub window: FetchWindow,
    pub error: String,
}

/// Outcome of syncing one symbol.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub symbol: String,
    pub windows_planned: usize,
    pub windows_fetched: usize,
    pub bars_written: usize,
    pub failed_windows: Vec<FailedWindow>,
}

impl FetchReport {
    /// True when every planned window was fetched and persisted.
    pub fn is_complete(&self) -> bool {
        self.failed_windows.is_empty()
    }
}

/// Outcome of a bulk sync across symbols.
#[derive(Debug, Clone, Default)]
pub struct BulkFetchReport {
    pub reports: Vec<FetchReport>,
}

impl BulkFetchReport {
    pub fn total_bars_written(&self) -> usize {
        self.reports.iter().map(|r| r.bars_written).sum()
    }

    pub fn symbols_with_failures(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| !r.is_complete())
            .map(|r| r.symbol.as_str())
            .collect()
    }
}

/// Keeps the price cache synchronized with the upstream market-data provider.
pub struct PriceSyncService {
    gateway: Arc<dyn MarketDataGateway>,
    store: Arc<dyn PriceStore>,
    batch_days: i64,
    throttle: bool,
}

impl PriceSyncService {
    pub fn new(gateway: Arc<dyn MarketDataGateway>, store: Arc<dyn PriceStore>) -> Self {
        Self {
            gateway,
            store,
            batch_days: DEFAULT_BATCH_DAYS,
            throttle: true,
        }
    }

    /// Overrides the fetch window size.
    pub fn with_batch_days(mut self, batch_days: i64) -> Self {
        self.batch_days = batch_days.max(1);
        self
    }

    /// Disables inter-window and inter-symbol delays. Test use.
    pub fn without_throttle(mut self) -> Self {
        self.throttle = false;
        self
    }

    /// Computes the uncovered spans of `[start, end]` given existing coverage.
    ///
    /// With no metadata the whole range is a gap. With coverage, only the
    /// spans strictly before `first_date` and strictly after `last_date`
    /// remain. Interior coverage is assumed dense; a symbol whose interior
    /// needs repair goes through `force_refresh` instead.
    pub fn plan_gaps(
        metadata: Option<&SymbolMetadata>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<FetchWindow> {
        if start > end {
            return Vec::new();
        }
        let meta = match metadata {
            Some(m) => m,
            None => return vec![FetchWindow { start, end }],
        };
        let mut gaps = Vec::new();
        if start < meta.first_date {
            gaps.push(FetchWindow {
                start,
                end: (meta.first_date - chrono::Duration::days(1)).min(end),
            });
        }
        if end > meta.last_date {
            gaps.push(FetchWindow {
                start: (meta.last_date + chrono::Duration::days(1)).max(start),
                end,
            });
        }
        gaps
    }

    /// Splits a span into windows of at most `batch_days` days.
    pub fn split_windows(gap: FetchWindow, batch_days: i64) -> Vec<FetchWindow> {
        let mut windows = Vec::new();
        let mut cursor = gap.start;
        while cursor <= gap.end {
            let window_end = (cursor + chrono::Duration::days(batch_days - 1)).min(gap.end);
            windows.push(FetchWindow {
                start: cursor,
                end: window_end,
            });
            cursor = window_end + chrono::Duration::days(1);
        }
        windows
    }

    /// Syncs one symbol over `[start, end]`, fetching only uncovered gaps.
    ///
    /// With `force_refresh`, cached data for the symbol is dropped first and
    /// the full range is refetched. A window that keeps failing after
    /// retries is recorded in the report; later windows still run, and
    /// everything fetched so far stays persisted.
    pub async fn sync_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        force_refresh: bool,
    ) -> Result<FetchReport> {
        if force_refresh {
            let dropped = self.store.delete_symbol(symbol).await?;
            debug!("force refresh for {}: dropped {} cached bars", symbol, dropped);
        }

        let metadata = self.store.metadata(symbol)?;
        let gaps = Self::plan_gaps(metadata.as_ref(), start, end);
        let windows: Vec<FetchWindow> = gaps
            .into_iter()
            .flat_map(|gap| Self::split_windows(gap, self.batch_days))
            .collect();

        let mut report = FetchReport {
            symbol: symbol.to_string(),
            windows_planned: windows.len(),
            ..Default::default()
        };
        if windows.is_empty() {
            debug!("{}: cache already covers {}..{}", symbol, start, end);
            return Ok(report);
        }

        for (idx, window) in windows.iter().enumerate() {
            if idx > 0 && self.throttle {
                tokio::time::sleep(Duration::from_millis(INTER_BATCH_DELAY_MS)).await;
            }
            match self.fetch_window_with_retry(symbol, *window).await {
                Ok(bars) => {
                    let written = self.store.upsert_bars(&bars).await?;
                    report.windows_fetched += 1;
                    report.bars_written += written;
                }
                Err(error) => {
                    warn!(
                        "{}: window {}..{} failed after {} attempts: {}",
                        symbol, window.start, window.end, MAX_FETCH_ATTEMPTS, error
                    );
                    report.failed_windows.push(FailedWindow {
                        window: *window,
                        error,
                    });
                }
            }
        }

        debug!(
            "{}: synced {}/{} windows, {} bars written",
            symbol, report.windows_fetched, report.windows_planned, report.bars_written
        );
        Ok(report)
    }

    /// Syncs many symbols, isolating failures per symbol.
    pub async fn sync_symbols(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
        force_refresh: bool,
    ) -> Result<BulkFetchReport> {
        let mut bulk = BulkFetchReport::default();
        for (idx, symbol) in symbols.iter().enumerate() {
            if idx > 0 && self.throttle {
                tokio::time::sleep(Duration::from_millis(INTER_SYMBOL_DELAY_MS)).await;
            }
            let report = self.sync_symbol(symbol, start, end, force_refresh).await?;
            bulk.reports.push(report);
        }
        Ok(bulk)
    }

    async fn fetch_window_with_retry(
        &self,
        symbol: &str,
        window: FetchWindow,
    ) -> std::result::Result<Vec<super::model::PriceBar>, String> {
        let mut last_error = String::new();
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            match self
                .gateway
                .fetch_bars(symbol, window.start, window.end)
                .await
            {
                Ok(bars) => return Ok(bars),
                Err(e) => {
                    last_error = e.to_string();
                    if !e.is_transient() || attempt == MAX_FETCH_ATTEMPTS {
                        if !e.is_transient() {
                            return Err(last_error);
                        }
                        break;
                    }
                    let backoff = RETRY_BASE_DELAY_MS * 2u64.pow(attempt - 1);
                    debug!(
                        "{}: attempt {} for {}..{} failed ({}), retrying in {}ms",
                        symbol, attempt, window.start, window.end, last_error, backoff
                    );
                    if self.throttle {
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }
        Err(last_error)
    }
}
