use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};

use super::currency_converter::CurrencyConverter;
use super::fx_errors::FxError;
use super::fx_model::ExchangeRate;
use crate::errors::Result;
use crate::quotes::PriceStore;

/// Currency conversion over rates held in the price cache.
///
/// FX pairs are cached as ordinary daily bars under Yahoo-style symbols
/// (`USDBRL=X`), so the same sync pipeline keeps them current. The service
/// builds a [`CurrencyConverter`] from the cached series on first use and
/// can be refreshed after a sync.
pub struct FxService {
    store: Arc<dyn PriceStore>,
    converter: RwLock<Option<CurrencyConverter>>,
}

impl FxService {
    pub fn new(store: Arc<dyn PriceStore>) -> Self {
        Self {
            store,
            converter: RwLock::new(None),
        }
    }

    /// Rebuilds the converter from every FX series found in the cache.
    pub fn refresh(&self) -> Result<()> {
        let mut rates = Vec::new();
        for meta in self.store.all_metadata()? {
            let (from, to) = match ExchangeRate::parse_cache_symbol(&meta.symbol) {
                Some(pair) => pair,
                None => continue,
            };
            let bars = self
                .store
                .bars_in_range(&meta.symbol, meta.first_date, meta.last_date)?;
            rates.extend(bars.into_iter().map(|bar| {
                ExchangeRate::new(from.clone(), to.clone(), bar.date, bar.close)
            }));
        }
        if rates.is_empty() {
            warn!("no exchange rates in cache, converter not initialized");
        }
        let converter = CurrencyConverter::new(rates);
        let mut guard = self
            .converter
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        *guard = Some(converter);
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        let initialized = {
            let guard = self
                .converter
                .read()
                .map_err(|e| FxError::CacheError(e.to_string()))?;
            guard.is_some()
        };
        if !initialized {
            self.refresh()?;
        }
        Ok(())
    }

    /// Rate for a pair on a date, using the latest observation on or
    /// before it.
    pub fn get_rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        self.ensure_initialized()?;
        let guard = self
            .converter
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        match guard.as_ref() {
            Some(converter) => Ok(converter.rate(from, to, date)?),
            None => Err(FxError::RateNotFound(format!("{}/{}", from, to)).into()),
        }
    }

    /// Converts an amount between currencies as of a date.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if from == to || amount.is_zero() {
            return Ok(amount);
        }
        Ok(amount * self.get_rate(from, to, date)?)
    }
}
