use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reference index a bond accrues against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Indexer {
    Ipca,
    Cdi,
    Selic,
    Prefixed,
}

impl Indexer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Indexer::Ipca => "IPCA",
            Indexer::Cdi => "CDI",
            Indexer::Selic => "SELIC",
            Indexer::Prefixed => "PREFIXED",
        }
    }

    /// Parses broker-export spellings (`IPCA`, `CDI`, `SELIC`, `PRE`,
    /// `PREFIXADO`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "IPCA" | "IPCA+" => Some(Indexer::Ipca),
            "CDI" => Some(Indexer::Cdi),
            "SELIC" => Some(Indexer::Selic),
            "PRE" | "PREFIXED" | "PREFIXADO" => Some(Indexer::Prefixed),
            _ => None,
        }
    }
}

/// One fixed-income holding.
///
/// `percent_indexed` follows broker-export convention and its meaning
/// depends on the indexer: for CDI/SELIC it is the percentage of the
/// reference rate earned (`110` means 110% of CDI); for IPCA and prefixed
/// instruments it is the contracted annual rate in percent (`6.5` means
/// IPCA + 6.5% a.a., or a flat 6.5% a.a. when prefixed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondPosition {
    pub issue_id: String,
    pub title: String,
    pub issuer: String,
    pub indexer: Indexer,
    pub percent_indexed: Decimal,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Invested principal, the base of all accrual.
    pub principal: Decimal,
    pub issue_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub currency: String,
}

impl BondPosition {
    pub fn is_matured(&self, as_of: NaiveDate) -> bool {
        as_of > self.maturity_date
    }
}

/// A bond valued as of a date.
///
/// `approximated` is set when any month of the accrual used the fixed
/// fallback rate instead of a published indexer observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondValuation {
    pub issue_id: String,
    pub title: String,
    pub indexer: Indexer,
    pub principal: Decimal,
    pub accrued_value: Decimal,
    pub gain: Decimal,
    pub approximated: bool,
    pub matured: bool,
}

/// One rung of the maturity schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityEntry {
    pub issue_id: String,
    pub title: String,
    pub maturity_date: NaiveDate,
    pub days_to_maturity: i64,
    pub accrued_value: Decimal,
}

/// Aggregate view over a set of bond valuations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BondPortfolioSummary {
    pub total_principal: Decimal,
    pub total_accrued: Decimal,
    pub total_gain: Decimal,
    pub active_count: usize,
    pub matured_count: usize,
    pub approximated_count: usize,
    /// Accrued value per indexer as a fraction of the accrued total.
    pub allocation_by_indexer: Vec<(Indexer, Decimal)>,
}
