use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Asset classes handled by transaction-replay ledgers.
///
/// Bonds accrue by indexation instead of trading on a price series and
/// live in their own engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Equity,
    Crypto,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "EQUITY",
            AssetClass::Crypto => "CRYPTO",
        }
    }
}

/// One signed trade. Positive quantity buys, negative sells.
///
/// Immutable once recorded; replay order is ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub asset_class: AssetClass,
    pub symbol: String,
    pub date: NaiveDate,
    pub signed_quantity: Decimal,
    pub price: Decimal,
    pub currency: String,
    pub market: Option<String>,
}

/// Running state for one symbol, owned by its ledger.
///
/// `avg_cost` moves only on buys (quantity-weighted mean of buy prices);
/// sells book into `realized_pnl` and leave `avg_cost` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub realized_pnl: Decimal,
    pub currency: String,
}

impl Position {
    pub fn new(symbol: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            currency: currency.into(),
        }
    }

    /// Total cost basis of the open quantity.
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.avg_cost
    }

    pub fn is_open(&self) -> bool {
        !self.quantity.is_zero()
    }
}

/// What to do when a sell exceeds the held quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortSalePolicy {
    /// Reject the transaction with an error.
    #[default]
    Reject,
    /// Let the position go negative; the uncovered portion opens a short
    /// at the sell price.
    AllowShort,
}

/// A position valued against the price cache as of a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub position: Position,
    pub price: Decimal,
    pub price_date: NaiveDate,
    /// Set when the price is a last-known fallback rather than a bar at or
    /// near the as-of date.
    pub price_stale: bool,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}
