use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::performance::{BenchmarkComparison, DrawdownEpisode, MonthlyReturn, RiskMetrics, SeriesPoint};

/// Value share per bucket of the consolidated view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub label: String,
    pub value: Decimal,
    pub share: Decimal,
}

/// Latest known rate for one currency pair, as used in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub date: NaiveDate,
}

/// Whole-fund snapshot in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedSummary {
    pub as_of: NaiveDate,
    pub base_currency: String,
    pub total_value: Decimal,
    pub total_pnl: Decimal,
    pub allocation: Vec<AllocationSlice>,
    pub exchange_rates: Vec<QuotedRate>,
    /// Any stale price or approximated bond accrual taints the summary.
    pub approximate: bool,
}

/// NAV history with derived statistics, ready for a dashboard layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePayload {
    pub nav_series: Vec<SeriesPoint>,
    pub risk_metrics: RiskMetrics,
    pub drawdown_episodes: Vec<DrawdownEpisode>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub benchmark: Option<BenchmarkComparison>,
}
