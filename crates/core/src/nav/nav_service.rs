use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::nav_model::{InvestorAllocation, NavSnapshot};
use crate::cash::InvestorContribution;
use crate::constants::MONEY_PRECISION;
use crate::errors::{Result, ValidationError};

/// Derives NAV snapshots and distributes them across investors.
#[derive(Default)]
pub struct NavCalculator;

impl NavCalculator {
    pub fn new() -> Self {
        Self
    }

    /// `nav = portfolio_value + cash − outstanding_fees`, money precision.
    pub fn snapshot(
        &self,
        date: NaiveDate,
        portfolio_value: Decimal,
        cash_position: Decimal,
        outstanding_fees: Decimal,
        approximate: bool,
    ) -> NavSnapshot {
        let nav =
            (portfolio_value + cash_position - outstanding_fees).round_dp(MONEY_PRECISION);
        debug!(
            "nav {}: positions {} + cash {} - fees {} = {}",
            date, portfolio_value, cash_position, outstanding_fees, nav
        );
        NavSnapshot {
            date,
            portfolio_value,
            cash_position,
            outstanding_fees,
            nav,
            approximate,
        }
    }

    /// Splits a NAV across investors proportionally to their stakes.
    ///
    /// Per-investor values are rounded to cents; the rounding residual is
    /// folded into the largest stake so the allocations add back up to the
    /// fund NAV.
    pub fn allocate_to_investors(
        &self,
        snapshot: &NavSnapshot,
        contributions: &[InvestorContribution],
    ) -> Result<Vec<InvestorAllocation>> {
        let total_stake: Decimal = contributions.iter().map(|c| c.stake_pct).sum();
        if contributions.is_empty() || total_stake.is_zero() {
            return Err(ValidationError::InvalidInput(
                "cannot allocate NAV without investor stakes".to_string(),
            )
            .into());
        }

        let mut allocations: Vec<InvestorAllocation> = contributions
            .iter()
            .map(|c| {
                let investor_nav =
                    (snapshot.nav * c.stake_pct / total_stake).round_dp(MONEY_PRECISION);
                InvestorAllocation {
                    investor_id: c.investor_id.clone(),
                    name: c.name.clone(),
                    stake_pct: c.stake_pct,
                    investor_nav,
                    net_contribution: c.net_contribution,
                    unrealized_gain: investor_nav - c.net_contribution,
                }
            })
            .collect();

        let allocated: Decimal = allocations.iter().map(|a| a.investor_nav).sum();
        let residual = snapshot.nav - allocated;
        if !residual.is_zero() {
            if let Some(largest) = allocations
                .iter_mut()
                .max_by(|a, b| a.stake_pct.cmp(&b.stake_pct))
            {
                largest.investor_nav += residual;
                largest.unrealized_gain += residual;
            }
        }
        Ok(allocations)
    }
}
