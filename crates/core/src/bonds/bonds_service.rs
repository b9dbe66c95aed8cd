use chrono::NaiveDate;
use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::HashMap;

use super::bonds_model::{
    BondPortfolioSummary, BondPosition, BondValuation, Indexer, MaturityEntry,
};
use super::indexer_table::{accrual_months, monthly_equivalent, IndexerTable};
use crate::constants::{DAYS_PER_YEAR_FRACTIONAL, INDEXER_FALLBACK_ANNUAL_RATE, MONEY_PRECISION};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Values fixed-income positions by compounding indexer observations.
///
/// Accrual always recomputes from the position's application date, so a
/// valuation is never stale relative to the loaded indexer series. Months
/// without a published observation compound at the fixed fallback rate and
/// taint the valuation as approximated.
pub struct BondIndexationEngine {
    table: IndexerTable,
    fallback_annual: Decimal,
}

impl BondIndexationEngine {
    pub fn new(table: IndexerTable) -> Self {
        Self {
            table,
            fallback_annual: INDEXER_FALLBACK_ANNUAL_RATE,
        }
    }

    pub fn indexer_table_mut(&mut self) -> &mut IndexerTable {
        &mut self.table
    }

    /// Accrued value of one bond as of a date.
    ///
    /// Accrual stops at maturity; querying past maturity returns the value
    /// at maturity with `matured` set.
    pub fn value(&self, bond: &BondPosition, as_of: NaiveDate) -> BondValuation {
        let accrual_end = as_of.min(bond.maturity_date);
        let (factor, approximated) = match bond.indexer {
            Indexer::Ipca => self.indexed_factor(bond, accrual_end, true),
            Indexer::Cdi | Indexer::Selic => self.indexed_factor(bond, accrual_end, false),
            Indexer::Prefixed => (self.fixed_leg(bond, accrual_end), false),
        };

        let accrued_value = (bond.principal * factor).round_dp(MONEY_PRECISION);
        debug!(
            "{} [{}]: factor {} -> {}",
            bond.title,
            bond.indexer.as_str(),
            factor,
            accrued_value
        );
        BondValuation {
            issue_id: bond.issue_id.clone(),
            title: bond.title.clone(),
            indexer: bond.indexer,
            principal: bond.principal,
            accrued_value,
            gain: accrued_value - bond.principal,
            approximated,
            matured: bond.is_matured(as_of),
        }
    }

    /// Compounds monthly indexer observations over the holding period.
    ///
    /// For IPCA the published monthly variation applies in full and the
    /// contracted real rate compounds on top. For CDI/SELIC the monthly
    /// reference rate is scaled by the contracted percentage.
    fn indexed_factor(
        &self,
        bond: &BondPosition,
        accrual_end: NaiveDate,
        inflation_linked: bool,
    ) -> (Decimal, bool) {
        let fallback_monthly = monthly_equivalent(self.fallback_annual);
        let mut factor = Decimal::ONE;
        let mut approximated = false;

        for (year, month) in accrual_months(bond.issue_date, accrual_end) {
            let monthly = match self.table.monthly_rate(bond.indexer, year, month) {
                Some(published) => {
                    if inflation_linked {
                        published / HUNDRED
                    } else {
                        (bond.percent_indexed / HUNDRED) * (published / HUNDRED)
                    }
                }
                None => {
                    approximated = true;
                    if inflation_linked {
                        fallback_monthly
                    } else {
                        (bond.percent_indexed / HUNDRED) * fallback_monthly
                    }
                }
            };
            factor *= Decimal::ONE + monthly;
        }

        if inflation_linked {
            factor *= self.fixed_leg(bond, accrual_end);
        }
        (factor, approximated)
    }

    /// `(1 + rate)^years` for the contracted annual rate.
    fn fixed_leg(&self, bond: &BondPosition, accrual_end: NaiveDate) -> Decimal {
        let days = (accrual_end - bond.issue_date).num_days();
        if days <= 0 {
            return Decimal::ONE;
        }
        let years = Decimal::from(days) / DAYS_PER_YEAR_FRACTIONAL;
        (Decimal::ONE + bond.percent_indexed / HUNDRED).powd(years)
    }

    pub fn value_all(&self, bonds: &[BondPosition], as_of: NaiveDate) -> Vec<BondValuation> {
        bonds.iter().map(|b| self.value(b, as_of)).collect()
    }

    /// Aggregate totals and indexer allocation over active positions.
    ///
    /// Matured bonds are excluded from the totals and the allocation; they
    /// only contribute to `matured_count`.
    pub fn summary(&self, bonds: &[BondPosition], as_of: NaiveDate) -> BondPortfolioSummary {
        let valuations = self.value_all(bonds, as_of);
        let mut summary = BondPortfolioSummary::default();
        let mut by_indexer: HashMap<Indexer, Decimal> = HashMap::new();

        for valuation in &valuations {
            if valuation.matured {
                summary.matured_count += 1;
                continue;
            }
            summary.active_count += 1;
            summary.total_principal += valuation.principal;
            summary.total_accrued += valuation.accrued_value;
            summary.total_gain += valuation.gain;
            if valuation.approximated {
                summary.approximated_count += 1;
            }
            *by_indexer.entry(valuation.indexer).or_default() += valuation.accrued_value;
        }

        if !summary.total_accrued.is_zero() {
            let mut allocation: Vec<(Indexer, Decimal)> = by_indexer
                .into_iter()
                .map(|(indexer, accrued)| (indexer, accrued / summary.total_accrued))
                .collect();
            allocation.sort_by(|a, b| b.1.cmp(&a.1));
            summary.allocation_by_indexer = allocation;
        }
        summary
    }

    /// Active positions ordered by maturity date.
    pub fn maturity_schedule(&self, bonds: &[BondPosition], as_of: NaiveDate) -> Vec<MaturityEntry> {
        let mut schedule: Vec<MaturityEntry> = bonds
            .iter()
            .filter(|b| !b.is_matured(as_of))
            .map(|bond| {
                let valuation = self.value(bond, as_of);
                MaturityEntry {
                    issue_id: bond.issue_id.clone(),
                    title: bond.title.clone(),
                    maturity_date: bond.maturity_date,
                    days_to_maturity: (bond.maturity_date - as_of).num_days(),
                    accrued_value: valuation.accrued_value,
                }
            })
            .collect();
        schedule.sort_by_key(|entry| entry.maturity_date);
        schedule
    }
}
