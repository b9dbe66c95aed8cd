use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of a value series (NAV or benchmark close).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// Risk statistics over one value series.
///
/// Returns and ratios are fractions (0.10 means 10%); volatility and
/// downside deviation are annualized by √252.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub total_return: Decimal,
    pub annualized_return: Decimal,
    pub volatility: Decimal,
    pub downside_deviation: Decimal,
    pub sharpe_ratio: Decimal,
    pub sortino_ratio: Decimal,
    pub max_drawdown: Decimal,
    pub calmar_ratio: Decimal,
    pub var_95: Decimal,
    pub cvar_95: Decimal,
    pub var_99: Decimal,
    pub cvar_99: Decimal,
    pub win_rate: Decimal,
    /// Largest single-day return in the period.
    pub best_day: Decimal,
    /// Smallest (most negative) single-day return in the period.
    pub worst_day: Decimal,
}

/// One peak-to-trough decline, with recovery if it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownEpisode {
    pub peak_date: NaiveDate,
    pub trough_date: NaiveDate,
    /// First date the series closed at or above the prior peak, `None`
    /// while the episode is still open.
    pub recovery_date: Option<NaiveDate>,
    /// Decline depth as a positive fraction of the peak.
    pub depth: Decimal,
}

/// Portfolio measured against a benchmark over aligned dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub benchmark_symbol: String,
    pub portfolio_return: Decimal,
    pub benchmark_return: Decimal,
    pub beta: Decimal,
    pub simple_alpha: Decimal,
    pub jensens_alpha: Decimal,
    pub tracking_error: Decimal,
    pub information_ratio: Decimal,
    pub aligned_days: usize,
}

/// Windowed statistics at one date. Emitted only once a full window of
/// observations exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub volatility: Decimal,
    pub sharpe_ratio: Decimal,
}

/// Compounded return for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: Decimal,
}
