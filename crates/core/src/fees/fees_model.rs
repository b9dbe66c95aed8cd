use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    Management,
    Performance,
}

impl FeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Management => "MANAGEMENT",
            FeeType::Performance => "PERFORMANCE",
        }
    }
}

/// Lifecycle of a fee record. Paid is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeStatus {
    Pending,
    Calculated,
    Paid,
}

/// One calculated fee for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub id: String,
    pub fee_type: FeeType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub nav_start: Decimal,
    pub nav_end: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub status: FeeStatus,
    pub payment_date: Option<NaiveDate>,
}

impl FeeRecord {
    pub fn is_paid(&self) -> bool {
        self.status == FeeStatus::Paid
    }
}

/// Totals over a fee ledger, split by type and by payment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    pub management_total: Decimal,
    pub performance_total: Decimal,
    pub outstanding: Decimal,
    pub paid: Decimal,
}
