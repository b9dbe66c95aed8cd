use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net asset value of the fund at one date.
///
/// Always derivable from positions, cash, and fees; never stored as the
/// source of truth. `nav = portfolio_value + cash_position − outstanding_fees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSnapshot {
    pub date: NaiveDate,
    pub portfolio_value: Decimal,
    pub cash_position: Decimal,
    pub outstanding_fees: Decimal,
    pub nav: Decimal,
    /// Set when any input price or indexer value was a flagged fallback.
    pub approximate: bool,
}

/// One investor's slice of a NAV snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorAllocation {
    pub investor_id: String,
    pub name: String,
    pub stake_pct: Decimal,
    pub investor_nav: Decimal,
    pub net_contribution: Decimal,
    pub unrealized_gain: Decimal,
}
