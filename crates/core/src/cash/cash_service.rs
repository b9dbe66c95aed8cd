use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::cash_model::{
    CashFlow, CashFlowType, InvestorAccount, InvestorContribution, InvestorStatus,
};
use crate::errors::{Result, ValidationError};

/// Append-only cash ledger with an embedded investor registry.
///
/// Flows are never edited or deleted; a correction is a new offsetting
/// entry. Positions and stakes are always derived by summing flows up to
/// the query date, so any historical date can be reconstructed.
#[derive(Default)]
pub struct CashLedger {
    flows: Vec<CashFlow>,
    investors: BTreeMap<String, InvestorAccount>,
}

impl CashLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an investor. Re-registering an existing id refreshes the
    /// name and keeps the id unique.
    pub fn register_investor(&mut self, investor_id: &str, name: &str) -> &InvestorAccount {
        self.investors
            .entry(investor_id.to_string())
            .and_modify(|account| {
                if !name.is_empty() {
                    account.name = name.to_string();
                }
            })
            .or_insert_with(|| InvestorAccount {
                investor_id: investor_id.to_string(),
                name: name.to_string(),
                status: InvestorStatus::Active,
            })
    }

    pub fn set_investor_status(&mut self, investor_id: &str, status: InvestorStatus) -> Result<()> {
        let account = self
            .investors
            .get_mut(investor_id)
            .ok_or_else(|| ValidationError::InvalidInput(format!("unknown investor {}", investor_id)))?;
        account.status = status;
        Ok(())
    }

    pub fn investor(&self, investor_id: &str) -> Option<&InvestorAccount> {
        self.investors.get(investor_id)
    }

    pub fn investors(&self) -> impl Iterator<Item = &InvestorAccount> {
        self.investors.values()
    }

    /// Appends a flow, registering its investor on first sight.
    pub fn add_cash_flow(&mut self, flow: CashFlow) -> Result<()> {
        if flow.amount <= Decimal::ZERO || flow.amount_in_base_currency <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "non-positive cash flow amount for {} on {}",
                flow.investor_id, flow.date
            ))
            .into());
        }
        if flow.investor_id.is_empty() {
            return Err(ValidationError::MissingField("investor_id".to_string()).into());
        }
        self.register_investor(&flow.investor_id, "");
        self.flows.push(flow);
        Ok(())
    }

    pub fn flows(&self) -> &[CashFlow] {
        &self.flows
    }

    /// Fund cash position in base currency as of a date.
    pub fn cash_position(&self, as_of: NaiveDate) -> Decimal {
        self.flows
            .iter()
            .filter(|f| f.date <= as_of)
            .map(|f| f.signed_base_amount())
            .sum()
    }

    /// Deposits minus withdrawals for one investor as of a date.
    pub fn net_contribution(&self, investor_id: &str, as_of: NaiveDate) -> Decimal {
        self.flows
            .iter()
            .filter(|f| f.investor_id == investor_id && f.date <= as_of)
            .map(|f| f.signed_base_amount())
            .sum()
    }

    /// Total net contributions across all investors as of a date.
    pub fn total_net_contribution(&self, as_of: NaiveDate) -> Decimal {
        self.flows
            .iter()
            .filter(|f| f.date <= as_of)
            .map(|f| f.signed_base_amount())
            .sum()
    }

    /// Investor's proportional ownership of the fund as of a date.
    pub fn stake_pct(&self, investor_id: &str, as_of: NaiveDate) -> Result<Decimal> {
        let total = self.total_net_contribution(as_of);
        if total <= Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "no positive net contributions as of {}",
                as_of
            ))
            .into());
        }
        Ok(self.net_contribution(investor_id, as_of) / total)
    }

    /// Contribution breakdown for every registered investor, stakes summing
    /// to one when any contributions exist.
    pub fn contributions(&self, as_of: NaiveDate) -> Vec<InvestorContribution> {
        let total = self.total_net_contribution(as_of);
        self.investors
            .values()
            .map(|account| {
                let mut deposits = Decimal::ZERO;
                let mut withdrawals = Decimal::ZERO;
                let mut first_investment_date: Option<NaiveDate> = None;
                for flow in self
                    .flows
                    .iter()
                    .filter(|f| f.investor_id == account.investor_id && f.date <= as_of)
                {
                    match flow.flow_type {
                        CashFlowType::Deposit => deposits += flow.amount_in_base_currency,
                        CashFlowType::Withdrawal => withdrawals += flow.amount_in_base_currency,
                    }
                    first_investment_date = match first_investment_date {
                        Some(d) => Some(d.min(flow.date)),
                        None => Some(flow.date),
                    };
                }
                let net = deposits - withdrawals;
                InvestorContribution {
                    investor_id: account.investor_id.clone(),
                    name: account.name.clone(),
                    deposits,
                    withdrawals,
                    net_contribution: net,
                    stake_pct: if total > Decimal::ZERO {
                        net / total
                    } else {
                        Decimal::ZERO
                    },
                    first_investment_date,
                }
            })
            .collect()
    }
}
