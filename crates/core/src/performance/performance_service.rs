use chrono::{Datelike, NaiveDate};
use num_traits::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::performance_model::{
    BenchmarkComparison, DrawdownEpisode, MonthlyReturn, RiskMetrics, RollingPoint, SeriesPoint,
};
use crate::constants::{
    DAYS_PER_YEAR_FRACTIONAL, DECIMAL_PRECISION, SQRT_TRADING_DAYS, TRADING_DAYS_PER_YEAR,
};

/// Statistics over NAV and benchmark series.
///
/// All arithmetic stays in `Decimal`. Daily returns compound; nothing here
/// sums simple returns across days.
pub struct PerformanceAnalytics {
    risk_free_rate: Decimal,
}

impl Default for PerformanceAnalytics {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl PerformanceAnalytics {
    /// `risk_free_rate` is annual, as a fraction.
    pub fn new(risk_free_rate: Decimal) -> Self {
        Self { risk_free_rate }
    }

    // ===== Return series =====

    /// `r_t = v_t / v_{t-1} - 1` for consecutive points, zero-valued
    /// predecessors skipped.
    pub fn daily_returns(series: &[SeriesPoint]) -> Vec<SeriesPoint> {
        series
            .windows(2)
            .filter(|w| !w[0].value.is_zero())
            .map(|w| SeriesPoint::new(w[1].date, w[1].value / w[0].value - Decimal::ONE))
            .collect()
    }

    /// Compounding product of daily returns.
    pub fn cumulative_return(returns: &[Decimal]) -> Decimal {
        returns
            .iter()
            .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + r))
            - Decimal::ONE
    }

    pub fn annualized_return(
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_return: Decimal,
    ) -> Decimal {
        if start_date > end_date {
            return Decimal::ZERO;
        }
        // A loss of 100% or more cannot be annualized through powd.
        if total_return <= dec!(-1.0) {
            return dec!(-1.0);
        }
        let days = (end_date - start_date).num_days();
        if days <= 0 {
            return total_return;
        }
        let years = Decimal::from(days) / DAYS_PER_YEAR_FRACTIONAL;
        if years < Decimal::ONE {
            return total_return;
        }
        (Decimal::ONE + total_return).powd(Decimal::ONE / years) - Decimal::ONE
    }

    // ===== Dispersion =====

    fn stdev(values: &[Decimal]) -> Decimal {
        if values.len() < 2 {
            return Decimal::ZERO;
        }
        let count = Decimal::from(values.len());
        let mean: Decimal = values.iter().sum::<Decimal>() / count;
        let sum_squared_diff: Decimal = values
            .iter()
            .map(|&v| {
                let diff = v - mean;
                diff * diff
            })
            .sum();
        let variance = sum_squared_diff / (count - Decimal::ONE);
        if variance.is_sign_negative() {
            return Decimal::ZERO;
        }
        variance.sqrt().unwrap_or(Decimal::ZERO)
    }

    /// Annualized standard deviation of daily returns.
    pub fn volatility(daily_returns: &[Decimal]) -> Decimal {
        let annualization_factor = Decimal::from(TRADING_DAYS_PER_YEAR)
            .sqrt()
            .unwrap_or(SQRT_TRADING_DAYS);
        Self::stdev(daily_returns) * annualization_factor
    }

    /// Annualized standard deviation of negative daily returns only.
    pub fn downside_deviation(daily_returns: &[Decimal]) -> Decimal {
        let negative: Vec<Decimal> = daily_returns
            .iter()
            .copied()
            .filter(|r| *r < Decimal::ZERO)
            .collect();
        let annualization_factor = Decimal::from(TRADING_DAYS_PER_YEAR)
            .sqrt()
            .unwrap_or(SQRT_TRADING_DAYS);
        Self::stdev(&negative) * annualization_factor
    }

    // ===== Drawdowns =====

    /// Largest peak-to-trough decline as a positive fraction.
    pub fn max_drawdown(series: &[SeriesPoint]) -> Decimal {
        Self::drawdown_episodes(series)
            .into_iter()
            .map(|e| e.depth)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// Every decline from a running peak, with its recovery date when the
    /// series later regained the peak.
    pub fn drawdown_episodes(series: &[SeriesPoint]) -> Vec<DrawdownEpisode> {
        let mut episodes = Vec::new();
        let mut peak: Option<SeriesPoint> = None;
        let mut trough: Option<SeriesPoint> = None;

        for point in series {
            match peak {
                None => peak = Some(*point),
                Some(p) if point.value >= p.value => {
                    if let (Some(peak_point), Some(trough_point)) = (peak, trough) {
                        episodes.push(DrawdownEpisode {
                            peak_date: peak_point.date,
                            trough_date: trough_point.date,
                            recovery_date: Some(point.date),
                            depth: (peak_point.value - trough_point.value) / peak_point.value,
                        });
                    }
                    peak = Some(*point);
                    trough = None;
                }
                Some(_) => {
                    if trough.map(|t| point.value < t.value).unwrap_or(true) {
                        trough = Some(*point);
                    }
                }
            }
        }
        if let (Some(peak_point), Some(trough_point)) = (peak, trough) {
            episodes.push(DrawdownEpisode {
                peak_date: peak_point.date,
                trough_date: trough_point.date,
                recovery_date: None,
                depth: (peak_point.value - trough_point.value) / peak_point.value,
            });
        }
        episodes
    }

    // ===== Tail risk =====

    /// `(VaR, CVaR)` at the given confidence (e.g. `0.95`).
    ///
    /// VaR is the return at the `1 - confidence` percentile of the sorted
    /// daily-return distribution; CVaR averages the returns at or below it.
    pub fn value_at_risk(daily_returns: &[Decimal], confidence: Decimal) -> (Decimal, Decimal) {
        if daily_returns.is_empty() {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let mut sorted = daily_returns.to_vec();
        sorted.sort();

        let count = Decimal::from(sorted.len());
        let index = ((Decimal::ONE - confidence) * count)
            .floor()
            .to_usize()
            .unwrap_or(0)
            .min(sorted.len() - 1);
        let var = sorted[index];

        let tail: Vec<Decimal> = sorted.iter().copied().filter(|r| *r <= var).collect();
        let cvar = if tail.is_empty() {
            var
        } else {
            tail.iter().sum::<Decimal>() / Decimal::from(tail.len())
        };
        (var, cvar)
    }

    // ===== Ratios =====

    pub fn sharpe_ratio(&self, annualized_return: Decimal, volatility: Decimal) -> Decimal {
        if volatility.is_zero() {
            return Decimal::ZERO;
        }
        (annualized_return - self.risk_free_rate) / volatility
    }

    pub fn sortino_ratio(&self, annualized_return: Decimal, downside: Decimal) -> Decimal {
        if downside.is_zero() {
            return Decimal::ZERO;
        }
        (annualized_return - self.risk_free_rate) / downside
    }

    pub fn calmar_ratio(annualized_return: Decimal, max_drawdown: Decimal) -> Decimal {
        if max_drawdown.is_zero() {
            return Decimal::ZERO;
        }
        annualized_return / max_drawdown
    }

    /// Fraction of days with a positive return.
    pub fn win_rate(daily_returns: &[Decimal]) -> Decimal {
        if daily_returns.is_empty() {
            return Decimal::ZERO;
        }
        let winners = daily_returns.iter().filter(|r| **r > Decimal::ZERO).count();
        Decimal::from(winners) / Decimal::from(daily_returns.len())
    }

    // ===== Composite =====

    /// Full risk report over one value series.
    pub fn risk_metrics(&self, series: &[SeriesPoint]) -> RiskMetrics {
        if series.len() < 2 {
            return RiskMetrics::default();
        }
        let returns_points = Self::daily_returns(series);
        let returns: Vec<Decimal> = returns_points.iter().map(|p| p.value).collect();

        let period_start = series.first().map(|p| p.date);
        let period_end = series.last().map(|p| p.date);
        let total_return = Self::cumulative_return(&returns);
        let annualized_return = match (period_start, period_end) {
            (Some(start), Some(end)) => Self::annualized_return(start, end, total_return),
            _ => Decimal::ZERO,
        };
        let volatility = Self::volatility(&returns);
        let downside = Self::downside_deviation(&returns);
        let max_drawdown = Self::max_drawdown(series);
        let (var_95, cvar_95) = Self::value_at_risk(&returns, dec!(0.95));
        let (var_99, cvar_99) = Self::value_at_risk(&returns, dec!(0.99));
        let best_day = returns.iter().copied().max().unwrap_or_default();
        let worst_day = returns.iter().copied().min().unwrap_or_default();

        RiskMetrics {
            period_start,
            period_end,
            total_return: total_return.round_dp(DECIMAL_PRECISION),
            annualized_return: annualized_return.round_dp(DECIMAL_PRECISION),
            volatility: volatility.round_dp(DECIMAL_PRECISION),
            downside_deviation: downside.round_dp(DECIMAL_PRECISION),
            sharpe_ratio: self
                .sharpe_ratio(annualized_return, volatility)
                .round_dp(DECIMAL_PRECISION),
            sortino_ratio: self
                .sortino_ratio(annualized_return, downside)
                .round_dp(DECIMAL_PRECISION),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
            calmar_ratio: Self::calmar_ratio(annualized_return, max_drawdown)
                .round_dp(DECIMAL_PRECISION),
            var_95: var_95.round_dp(DECIMAL_PRECISION),
            cvar_95: cvar_95.round_dp(DECIMAL_PRECISION),
            var_99: var_99.round_dp(DECIMAL_PRECISION),
            cvar_99: cvar_99.round_dp(DECIMAL_PRECISION),
            win_rate: Self::win_rate(&returns).round_dp(DECIMAL_PRECISION),
            best_day: best_day.round_dp(DECIMAL_PRECISION),
            worst_day: worst_day.round_dp(DECIMAL_PRECISION),
        }
    }

    /// Compares a portfolio series against a benchmark series over their
    /// common dates.
    pub fn benchmark_comparison(
        &self,
        benchmark_symbol: &str,
        portfolio: &[SeriesPoint],
        benchmark: &[SeriesPoint],
    ) -> BenchmarkComparison {
        let portfolio_returns = Self::daily_returns(portfolio);
        let benchmark_by_date: HashMap<NaiveDate, Decimal> = Self::daily_returns(benchmark)
            .into_iter()
            .map(|p| (p.date, p.value))
            .collect();

        let mut aligned_portfolio = Vec::new();
        let mut aligned_benchmark = Vec::new();
        let mut first_date = None;
        let mut last_date = None;
        for point in &portfolio_returns {
            if let Some(benchmark_return) = benchmark_by_date.get(&point.date) {
                aligned_portfolio.push(point.value);
                aligned_benchmark.push(*benchmark_return);
                first_date.get_or_insert(point.date);
                last_date = Some(point.date);
            }
        }

        let mut comparison = BenchmarkComparison {
            benchmark_symbol: benchmark_symbol.to_string(),
            aligned_days: aligned_portfolio.len(),
            ..Default::default()
        };
        if aligned_portfolio.len() < 2 {
            return comparison;
        }
        let (start, end) = match (first_date, last_date) {
            (Some(s), Some(e)) => (s, e),
            _ => return comparison,
        };

        let portfolio_total = Self::cumulative_return(&aligned_portfolio);
        let benchmark_total = Self::cumulative_return(&aligned_benchmark);
        let portfolio_annual = Self::annualized_return(start, end, portfolio_total);
        let benchmark_annual = Self::annualized_return(start, end, benchmark_total);

        let beta = Self::beta(&aligned_portfolio, &aligned_benchmark);
        let simple_alpha = portfolio_annual - benchmark_annual;
        let jensens_alpha = portfolio_annual
            - (self.risk_free_rate + beta * (benchmark_annual - self.risk_free_rate));

        let diffs: Vec<Decimal> = aligned_portfolio
            .iter()
            .zip(&aligned_benchmark)
            .map(|(p, b)| p - b)
            .collect();
        let tracking_error = Self::volatility(&diffs);
        let information_ratio = if tracking_error.is_zero() {
            Decimal::ZERO
        } else {
            simple_alpha / tracking_error
        };

        comparison.portfolio_return = portfolio_annual.round_dp(DECIMAL_PRECISION);
        comparison.benchmark_return = benchmark_annual.round_dp(DECIMAL_PRECISION);
        comparison.beta = beta.round_dp(DECIMAL_PRECISION);
        comparison.simple_alpha = simple_alpha.round_dp(DECIMAL_PRECISION);
        comparison.jensens_alpha = jensens_alpha.round_dp(DECIMAL_PRECISION);
        comparison.tracking_error = tracking_error.round_dp(DECIMAL_PRECISION);
        comparison.information_ratio = information_ratio.round_dp(DECIMAL_PRECISION);
        comparison
    }

    /// `Cov(portfolio, benchmark) / Var(benchmark)` over aligned returns.
    pub fn beta(portfolio_returns: &[Decimal], benchmark_returns: &[Decimal]) -> Decimal {
        let n = portfolio_returns.len().min(benchmark_returns.len());
        if n < 2 {
            return Decimal::ZERO;
        }
        let count = Decimal::from(n);
        let portfolio_mean: Decimal = portfolio_returns[..n].iter().sum::<Decimal>() / count;
        let benchmark_mean: Decimal = benchmark_returns[..n].iter().sum::<Decimal>() / count;

        let mut covariance = Decimal::ZERO;
        let mut benchmark_variance = Decimal::ZERO;
        for i in 0..n {
            let dp = portfolio_returns[i] - portfolio_mean;
            let db = benchmark_returns[i] - benchmark_mean;
            covariance += dp * db;
            benchmark_variance += db * db;
        }
        if benchmark_variance.is_zero() {
            return Decimal::ZERO;
        }
        covariance / benchmark_variance
    }

    /// Rolling volatility and Sharpe over a fixed window of daily returns.
    /// Nothing is emitted until a full window exists.
    pub fn rolling_metrics(&self, series: &[SeriesPoint], window: usize) -> Vec<RollingPoint> {
        let returns = Self::daily_returns(series);
        if window == 0 || returns.len() < window {
            return Vec::new();
        }
        let mut points = Vec::with_capacity(returns.len() - window + 1);
        for end in window..=returns.len() {
            let slice: Vec<Decimal> = returns[end - window..end].iter().map(|p| p.value).collect();
            let volatility = Self::volatility(&slice);
            let window_return = Self::cumulative_return(&slice);
            let annualized = (Decimal::ONE + window_return)
                .powd(Decimal::from(TRADING_DAYS_PER_YEAR) / Decimal::from(window as i64))
                - Decimal::ONE;
            points.push(RollingPoint {
                date: returns[end - 1].date,
                volatility: volatility.round_dp(DECIMAL_PRECISION),
                sharpe_ratio: self
                    .sharpe_ratio(annualized, volatility)
                    .round_dp(DECIMAL_PRECISION),
            });
        }
        points
    }

    /// Compounded return per calendar month, from the value series.
    pub fn monthly_returns(series: &[SeriesPoint]) -> Vec<MonthlyReturn> {
        let mut months: Vec<MonthlyReturn> = Vec::new();
        for point in Self::daily_returns(series) {
            let (year, month) = (point.date.year(), point.date.month());
            match months.last_mut() {
                Some(last) if last.year == year && last.month == month => {
                    last.value =
                        (Decimal::ONE + last.value) * (Decimal::ONE + point.value) - Decimal::ONE;
                }
                _ => months.push(MonthlyReturn {
                    year,
                    month,
                    value: point.value,
                }),
            }
        }
        for month in &mut months {
            month.value = month.value.round_dp(DECIMAL_PRECISION);
        }
        months
    }
}
