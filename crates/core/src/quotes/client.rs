//! Market-data gateways.
//!
//! External boundary of the engine: everything upstream of the price cache
//! goes through the [`MarketDataGateway`] and [`IndexerGateway`] traits so
//! providers can be swapped and tests can use canned data.
//!
//! `YahooGateway` speaks the Yahoo chart API (daily interval, dividend and
//! split events folded into bars). `BcbGateway` fetches monthly indexer
//! series (IPCA/CDI/SELIC) from the Banco Central do Brasil SGS API.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use super::constants::{BCB_SERIES_CDI, BCB_SERIES_IPCA, BCB_SERIES_SELIC};
use super::errors::MarketDataError;
use super::model::{IndexerObservation, PriceBar};

/// Fetches daily OHLC bars for a symbol over a bounded date window.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Fetches bars for `[start, end]`. An empty result is not an error:
    /// weekends, holidays, and instruments without data simply yield
    /// nothing for the window.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketDataError>;
}

/// Economic indexer identifiers supported by the bond engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexerSeriesId {
    Ipca,
    Cdi,
    Selic,
}

impl IndexerSeriesId {
    fn bcb_code(&self) -> u32 {
        match self {
            IndexerSeriesId::Ipca => BCB_SERIES_IPCA,
            IndexerSeriesId::Cdi => BCB_SERIES_CDI,
            IndexerSeriesId::Selic => BCB_SERIES_SELIC,
        }
    }
}

/// Fetches monthly observations of an economic indexer series.
#[async_trait]
pub trait IndexerGateway: Send + Sync {
    async fn fetch_series(
        &self,
        series: IndexerSeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexerObservation>, MarketDataError>;
}

// =============================================================================
// Yahoo chart API
// =============================================================================

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    description: Option<String>,
}

#[derive(Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
    #[serde(default)]
    events: Option<ChartEvents>,
}

#[derive(Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
    adjclose: Option<Vec<ChartAdjClose>>,
}

#[derive(Deserialize)]
struct ChartQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct ChartAdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Default)]
struct ChartEvents {
    #[serde(default)]
    dividends: HashMap<String, DividendEvent>,
    #[serde(default)]
    splits: HashMap<String, SplitEvent>,
}

#[derive(Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Deserialize)]
struct SplitEvent {
    numerator: f64,
    denominator: f64,
    date: i64,
}

/// Yahoo Finance chart-API gateway.
pub struct YahooGateway {
    client: reqwest::Client,
    base_url: String,
}

impl Default for YahooGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: YAHOO_CHART_URL.to_string(),
        }
    }

    /// Points the gateway at a different base URL (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn decimal(value: Option<f64>) -> Option<Decimal> {
        value.and_then(Decimal::from_f64_retain)
    }

    fn bars_from_result(symbol: &str, result: ChartResult) -> Vec<PriceBar> {
        let timestamps = result.timestamp.unwrap_or_default();
        let quote = match result.indicators.quote.into_iter().next() {
            Some(q) => q,
            None => return Vec::new(),
        };
        let adjclose = result
            .indicators
            .adjclose
            .and_then(|mut a| a.pop())
            .and_then(|a| a.adjclose)
            .unwrap_or_default();

        let events = result.events.unwrap_or_default();
        let mut dividends: HashMap<NaiveDate, Decimal> = HashMap::new();
        for event in events.dividends.into_values() {
            if let (Some(date), Some(amount)) = (
                DateTime::<Utc>::from_timestamp(event.date, 0).map(|d| d.date_naive()),
                Decimal::from_f64_retain(event.amount),
            ) {
                dividends.insert(date, amount);
            }
        }
        let mut splits: HashMap<NaiveDate, Decimal> = HashMap::new();
        for event in events.splits.into_values() {
            if event.denominator == 0.0 {
                continue;
            }
            if let (Some(date), Some(ratio)) = (
                DateTime::<Utc>::from_timestamp(event.date, 0).map(|d| d.date_naive()),
                Decimal::from_f64_retain(event.numerator / event.denominator),
            ) {
                splits.insert(date, ratio);
            }
        }

        let column = |col: &Option<Vec<Option<f64>>>, idx: usize| -> Option<f64> {
            col.as_ref().and_then(|v| v.get(idx).copied().flatten())
        };

        let mut bars = Vec::with_capacity(timestamps.len());
        for (idx, ts) in timestamps.iter().enumerate() {
            let date = match DateTime::<Utc>::from_timestamp(*ts, 0) {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            // Rows without a close are placeholder entries, skip them.
            let close = match Self::decimal(column(&quote.close, idx)) {
                Some(c) => c,
                None => continue,
            };
            let adj = Self::decimal(adjclose.get(idx).copied().flatten()).unwrap_or(close);
            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open: Self::decimal(column(&quote.open, idx)).unwrap_or(close),
                high: Self::decimal(column(&quote.high, idx)).unwrap_or(close),
                low: Self::decimal(column(&quote.low, idx)).unwrap_or(close),
                close,
                adj_close: adj,
                volume: Self::decimal(column(&quote.volume, idx)).unwrap_or_default(),
                dividend: dividends.get(&date).copied().unwrap_or_default(),
                split: splits.get(&date).copied().unwrap_or(Decimal::ONE),
            });
        }
        bars.sort_by_key(|b| b.date);
        bars
    }
}

#[async_trait]
impl MarketDataGateway for YahooGateway {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let period2 = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        let url = format!("{}/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimitExceeded(symbol.to_string()));
        }
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketDataError::NotFound(symbol.to_string()));
        }
        if !response.status().is_success() {
            return Err(MarketDataError::ProviderError(format!(
                "{}: HTTP {}",
                symbol,
                response.status()
            )));
        }

        let payload: ChartResponse = response.json().await?;
        if let Some(error) = payload.chart.error {
            return Err(MarketDataError::ProviderError(
                error.description.unwrap_or_else(|| symbol.to_string()),
            ));
        }
        let result = payload
            .chart
            .result
            .and_then(|mut r| (!r.is_empty()).then(|| r.remove(0)))
            .ok_or(MarketDataError::NoData)?;

        Ok(Self::bars_from_result(symbol, result))
    }
}

// =============================================================================
// Banco Central SGS API
// =============================================================================

const BCB_BASE_URL: &str = "https://api.bcb.gov.br/dados/serie";

#[derive(Deserialize)]
struct SgsEntry {
    data: String,
    valor: String,
}

/// Banco Central do Brasil SGS gateway for monthly indexer series.
pub struct BcbGateway {
    client: reqwest::Client,
    base_url: String,
}

impl Default for BcbGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl BcbGateway {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BCB_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl IndexerGateway for BcbGateway {
    async fn fetch_series(
        &self,
        series: IndexerSeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IndexerObservation>, MarketDataError> {
        // SGS expects DD/MM/YYYY bounds.
        let url = format!("{}/bcdata.sgs.{}/dados", self.base_url, series.bcb_code());
        let response = self
            .client
            .get(&url)
            .query(&[
                ("formato", "json".to_string()),
                ("dataInicial", start.format("%d/%m/%Y").to_string()),
                ("dataFinal", end.format("%d/%m/%Y").to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketDataError::ProviderError(format!(
                "SGS series {}: HTTP {}",
                series.bcb_code(),
                response.status()
            )));
        }

        let entries: Vec<SgsEntry> = response.json().await?;
        let mut observations = Vec::with_capacity(entries.len());
        for entry in entries {
            let date = NaiveDate::parse_from_str(&entry.data, "%d/%m/%Y")
                .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;
            let value = entry
                .valor
                .parse::<Decimal>()
                .map_err(|e| MarketDataError::ParsingError(e.to_string()))?;
            observations.push(IndexerObservation { date, value });
        }
        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_from_result_skips_null_closes() {
        let result = ChartResult {
            timestamp: Some(vec![1_709_251_200, 1_709_337_600]),
            indicators: ChartIndicators {
                quote: vec![ChartQuote {
                    open: Some(vec![Some(10.0), None]),
                    high: Some(vec![Some(10.5), None]),
                    low: Some(vec![Some(9.8), None]),
                    close: Some(vec![Some(10.2), None]),
                    volume: Some(vec![Some(1000.0), None]),
                }],
                adjclose: None,
            },
            events: None,
        };
        let bars = YahooGateway::bars_from_result("AAPL", result);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].adj_close, bars[0].close);
        assert_eq!(bars[0].split, Decimal::ONE);
    }
}
