use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestorStatus {
    #[default]
    Active,
    Inactive,
}

/// A registered investor. `investor_id` is unique across the fund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorAccount {
    pub investor_id: String,
    pub name: String,
    pub status: InvestorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashFlowType {
    Deposit,
    Withdrawal,
}

impl CashFlowType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "DEPOSIT" => Some(CashFlowType::Deposit),
            "WITHDRAWAL" => Some(CashFlowType::Withdrawal),
            _ => None,
        }
    }
}

/// One ledger entry. `amount` is always positive; the type carries the
/// direction. Entries are never edited, corrections are new offsetting
/// entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub investor_id: String,
    pub flow_type: CashFlowType,
    pub amount: Decimal,
    pub currency: String,
    /// Amount converted to the fund's base currency at entry time. Equals
    /// `amount` when the flow is already in base currency.
    pub amount_in_base_currency: Decimal,
    pub description: Option<String>,
}

impl CashFlow {
    /// Base-currency amount signed by direction.
    pub fn signed_base_amount(&self) -> Decimal {
        match self.flow_type {
            CashFlowType::Deposit => self.amount_in_base_currency,
            CashFlowType::Withdrawal => -self.amount_in_base_currency,
        }
    }
}

/// An investor's contribution picture as of a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorContribution {
    pub investor_id: String,
    pub name: String,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub net_contribution: Decimal,
    pub stake_pct: Decimal,
    /// Date of the investor's earliest flow, `None` before any flow.
    pub first_investment_date: Option<NaiveDate>,
}
