use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A historical exchange rate observation for one currency pair.
///
/// `rate` is the amount of `to_currency` bought by one unit of
/// `from_currency` on `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub date: NaiveDate,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(
        from_currency: impl Into<String>,
        to_currency: impl Into<String>,
        date: NaiveDate,
        rate: Decimal,
    ) -> Self {
        Self {
            from_currency: from_currency.into(),
            to_currency: to_currency.into(),
            date,
            rate,
        }
    }

    /// Cache symbol used to store this pair as daily bars, Yahoo style.
    /// `("USD", "BRL")` maps to `"USDBRL=X"`.
    pub fn cache_symbol(from: &str, to: &str) -> String {
        format!("{}{}=X", from, to)
    }

    /// Parses a cache symbol back into `(from, to)`.
    pub fn parse_cache_symbol(symbol: &str) -> Option<(String, String)> {
        let pair = symbol.strip_suffix("=X")?;
        if pair.len() != 6 {
            return None;
        }
        Some((pair[..3].to_string(), pair[3..].to_string()))
    }
}
