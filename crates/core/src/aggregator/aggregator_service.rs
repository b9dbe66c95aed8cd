use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::aggregator_model::{
    AllocationSlice, ConsolidatedSummary, PerformancePayload, QuotedRate,
};
use crate::bonds::{BondIndexationEngine, BondPosition};
use crate::cash::CashLedger;
use crate::constants::MONEY_PRECISION;
use crate::errors::Result;
use crate::fees::{FeeEngine, FeeRecord, FeeSummary};
use crate::fx::{ExchangeRate, FxService};
use crate::ledger::{AssetClass, PositionLedger};
use crate::nav::{InvestorAllocation, NavCalculator, NavSnapshot};
use crate::performance::{PerformanceAnalytics, SeriesPoint};
use crate::quotes::PriceStore;

/// Root facade over ledgers, bonds, cash, fees, FX, and analytics.
///
/// Owns the mutable fund state; reads flow through it into consolidated
/// read models. One aggregator per fund.
pub struct PortfolioAggregator {
    base_currency: String,
    store: Arc<dyn PriceStore>,
    fx: FxService,
    ledgers: Vec<PositionLedger>,
    bonds: Vec<BondPosition>,
    bond_engine: BondIndexationEngine,
    cash: CashLedger,
    fees: FeeEngine,
    nav_calculator: NavCalculator,
    analytics: PerformanceAnalytics,
}

impl PortfolioAggregator {
    pub fn new(
        base_currency: impl Into<String>,
        store: Arc<dyn PriceStore>,
        bond_engine: BondIndexationEngine,
        fees: FeeEngine,
        risk_free_rate: Decimal,
    ) -> Self {
        Self {
            base_currency: base_currency.into(),
            fx: FxService::new(store.clone()),
            store,
            ledgers: vec![
                PositionLedger::new(AssetClass::Equity),
                PositionLedger::new(AssetClass::Crypto),
            ],
            bonds: Vec::new(),
            bond_engine,
            cash: CashLedger::new(),
            fees,
            nav_calculator: NavCalculator::new(),
            analytics: PerformanceAnalytics::new(risk_free_rate),
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    // ===== State mutation =====

    pub fn ledger_mut(&mut self, asset_class: AssetClass) -> &mut PositionLedger {
        let index = match self
            .ledgers
            .iter()
            .position(|l| l.asset_class() == asset_class)
        {
            Some(index) => index,
            None => {
                self.ledgers.push(PositionLedger::new(asset_class));
                self.ledgers.len() - 1
            }
        };
        &mut self.ledgers[index]
    }

    pub fn add_bonds(&mut self, bonds: Vec<BondPosition>) {
        self.bonds.extend(bonds);
    }

    pub fn cash_mut(&mut self) -> &mut CashLedger {
        &mut self.cash
    }

    pub fn cash(&self) -> &CashLedger {
        &self.cash
    }

    pub fn fees(&self) -> &FeeEngine {
        &self.fees
    }

    pub fn bond_engine_mut(&mut self) -> &mut BondIndexationEngine {
        &mut self.bond_engine
    }

    /// Calculates period fees against NAVs derived at the boundaries.
    pub fn calculate_fees(
        &mut self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Vec<FeeRecord>> {
        let nav_start = self.nav_snapshot(period_start).ok().map(|s| s.nav);
        let nav_end = self.nav_snapshot(period_end).ok().map(|s| s.nav);
        self.fees
            .calculate(period_start, period_end, nav_start, nav_end)
    }

    pub fn mark_fee_paid(&mut self, record_id: &str, payment_date: NaiveDate) -> Result<()> {
        self.fees.mark_paid(record_id, payment_date)
    }

    // ===== Valuation =====

    /// Market value of traded positions in base currency, with a flag for
    /// any stale price used.
    fn traded_value(&self, as_of: NaiveDate) -> Result<(Decimal, Decimal, bool)> {
        let mut value = Decimal::ZERO;
        let mut unrealized = Decimal::ZERO;
        let mut stale = false;
        for ledger in &self.ledgers {
            for valuation in ledger.valuations(&self.store, as_of)? {
                let converted = self.fx.convert(
                    valuation.market_value,
                    &valuation.position.currency,
                    &self.base_currency,
                    as_of,
                )?;
                let converted_unrealized = self.fx.convert(
                    valuation.unrealized_pnl,
                    &valuation.position.currency,
                    &self.base_currency,
                    as_of,
                )?;
                if valuation.price_stale {
                    warn!(
                        "stale price for {} as of {} (bar {})",
                        valuation.position.symbol, as_of, valuation.price_date
                    );
                    stale = true;
                }
                value += converted;
                unrealized += converted_unrealized;
            }
        }
        Ok((value, unrealized, stale))
    }

    /// Fund NAV at a date: traded positions + bond accruals + cash, minus
    /// outstanding fees.
    pub fn nav_snapshot(&self, as_of: NaiveDate) -> Result<NavSnapshot> {
        let (traded, _, stale) = self.traded_value(as_of)?;
        let bond_summary = self.bond_engine.summary(&self.bonds, as_of);
        let portfolio_value =
            (traded + bond_summary.total_accrued).round_dp(MONEY_PRECISION);
        let cash_position = self.cash.cash_position(as_of);
        let outstanding_fees = self.fees.outstanding(as_of);

        Ok(self.nav_calculator.snapshot(
            as_of,
            portfolio_value,
            cash_position,
            outstanding_fees,
            stale || bond_summary.approximated_count > 0,
        ))
    }

    /// NAV at each requested date, ascending. Dates that cannot be valued
    /// (no prices at all yet) are skipped rather than failing the series.
    pub fn nav_series(&self, dates: &[NaiveDate]) -> Vec<SeriesPoint> {
        let mut sorted: Vec<NaiveDate> = dates.to_vec();
        sorted.sort();
        sorted.dedup();
        sorted
            .into_iter()
            .filter_map(|date| match self.nav_snapshot(date) {
                Ok(snapshot) => Some(SeriesPoint::new(date, snapshot.nav)),
                Err(e) => {
                    warn!("skipping NAV at {}: {}", date, e);
                    None
                }
            })
            .collect()
    }

    // ===== Read models =====

    pub fn consolidated_summary(&self, as_of: NaiveDate) -> Result<ConsolidatedSummary> {
        let (traded_total, unrealized, stale) = {
            let mut per_class: Vec<(AssetClass, Decimal)> = Vec::new();
            let mut unrealized = Decimal::ZERO;
            let mut stale = false;
            for ledger in &self.ledgers {
                let mut class_value = Decimal::ZERO;
                for valuation in ledger.valuations(&self.store, as_of)? {
                    class_value += self.fx.convert(
                        valuation.market_value,
                        &valuation.position.currency,
                        &self.base_currency,
                        as_of,
                    )?;
                    unrealized += self.fx.convert(
                        valuation.unrealized_pnl,
                        &valuation.position.currency,
                        &self.base_currency,
                        as_of,
                    )?;
                    stale |= valuation.price_stale;
                }
                per_class.push((ledger.asset_class(), class_value));
            }
            (per_class, unrealized, stale)
        };

        let bond_summary = self.bond_engine.summary(&self.bonds, as_of);
        let cash_value = self.cash.cash_position(as_of);
        let realized: Decimal = self.ledgers.iter().map(|l| l.total_realized_pnl()).sum();

        let total_value: Decimal = traded_total.iter().map(|(_, v)| *v).sum::<Decimal>()
            + bond_summary.total_accrued
            + cash_value;
        let total_pnl = unrealized + realized + bond_summary.total_gain;

        let mut allocation = Vec::new();
        let mut push_slice = |label: &str, value: Decimal| {
            if value.is_zero() {
                return;
            }
            let share = if total_value.is_zero() {
                Decimal::ZERO
            } else {
                value / total_value
            };
            allocation.push(AllocationSlice {
                label: label.to_string(),
                value: value.round_dp(MONEY_PRECISION),
                share: share.round_dp(crate::constants::DECIMAL_PRECISION),
            });
        };
        for (class, value) in &traded_total {
            push_slice(class.as_str(), *value);
        }
        push_slice("FIXED_INCOME", bond_summary.total_accrued);
        push_slice("CASH", cash_value);

        Ok(ConsolidatedSummary {
            as_of,
            base_currency: self.base_currency.clone(),
            total_value: total_value.round_dp(MONEY_PRECISION),
            total_pnl: total_pnl.round_dp(MONEY_PRECISION),
            allocation,
            exchange_rates: self.latest_exchange_rates()?,
            approximate: stale || bond_summary.approximated_count > 0,
        })
    }

    /// Latest cached rate for every FX pair in the price store.
    fn latest_exchange_rates(&self) -> Result<Vec<QuotedRate>> {
        let mut rates = Vec::new();
        for meta in self.store.all_metadata()? {
            if let Some((from, to)) = ExchangeRate::parse_cache_symbol(&meta.symbol) {
                if let Some(bar) = self.store.latest_bar(&meta.symbol)? {
                    rates.push(QuotedRate {
                        from_currency: from,
                        to_currency: to,
                        rate: bar.close,
                        date: bar.date,
                    });
                }
            }
        }
        rates.sort_by(|a, b| {
            (a.from_currency.as_str(), a.to_currency.as_str())
                .cmp(&(b.from_currency.as_str(), b.to_currency.as_str()))
        });
        Ok(rates)
    }

    /// NAV split across investors by stake.
    pub fn investor_allocations(&self, as_of: NaiveDate) -> Result<Vec<InvestorAllocation>> {
        let snapshot = self.nav_snapshot(as_of)?;
        let contributions = self.cash.contributions(as_of);
        self.nav_calculator
            .allocate_to_investors(&snapshot, &contributions)
    }

    pub fn fee_summary(&self) -> FeeSummary {
        self.fees.summary()
    }

    /// NAV history plus derived statistics, optionally against a cached
    /// benchmark series.
    pub fn performance_payload(
        &self,
        dates: &[NaiveDate],
        benchmark_symbol: Option<&str>,
    ) -> Result<PerformancePayload> {
        let nav_series = self.nav_series(dates);
        let risk_metrics = self.analytics.risk_metrics(&nav_series);
        let drawdown_episodes = PerformanceAnalytics::drawdown_episodes(&nav_series);
        let monthly_returns = PerformanceAnalytics::monthly_returns(&nav_series);

        let benchmark = match (benchmark_symbol, nav_series.first(), nav_series.last()) {
            (Some(symbol), Some(first), Some(last)) => {
                let bars = self.store.bars_in_range(symbol, first.date, last.date)?;
                let series: Vec<SeriesPoint> = bars
                    .into_iter()
                    .map(|bar| SeriesPoint::new(bar.date, bar.adj_close))
                    .collect();
                Some(
                    self.analytics
                        .benchmark_comparison(symbol, &nav_series, &series),
                )
            }
            _ => None,
        };

        Ok(PerformancePayload {
            nav_series,
            risk_metrics,
            drawdown_episodes,
            monthly_returns,
            benchmark,
        })
    }
}
