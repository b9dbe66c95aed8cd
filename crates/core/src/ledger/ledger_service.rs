use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::ledger_model::{AssetClass, Position, PositionValuation, ShortSalePolicy, Transaction};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{CalculatorError, Result};
use crate::imports::RowError;
use crate::quotes::{resolve_price, PriceStore};

/// Outcome of replaying a transaction batch.
///
/// Rejected transactions are reported under their 1-based position in the
/// input batch; the rest of the batch still applies.
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub applied: usize,
    pub errors: Vec<RowError>,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Replays a signed transaction log into running positions.
///
/// One ledger per asset class. Positions are owned by the ledger and only
/// mutate through replay. Cost basis is the quantity-weighted average of
/// buy prices; sells realize P&L against it without moving it.
pub struct PositionLedger {
    asset_class: AssetClass,
    policy: ShortSalePolicy,
    positions: HashMap<String, Position>,
}

impl PositionLedger {
    pub fn new(asset_class: AssetClass) -> Self {
        Self {
            asset_class,
            policy: ShortSalePolicy::default(),
            positions: HashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: ShortSalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Replays transactions in ascending date order on top of current state.
    ///
    /// A transaction that violates the short-sale policy, or fails basic
    /// validation, is rejected and reported under its position in the input
    /// batch; the remaining transactions still apply.
    pub fn replay(&mut self, transactions: &[Transaction]) -> ReplayReport {
        let mut ordered: Vec<(usize, &Transaction)> = transactions
            .iter()
            .enumerate()
            .filter(|(_, t)| t.asset_class == self.asset_class)
            .collect();
        ordered.sort_by_key(|(_, t)| t.date);

        let mut report = ReplayReport::default();
        for (index, transaction) in ordered {
            match self.apply(transaction) {
                Ok(()) => report.applied += 1,
                Err(e) => report.errors.push(RowError {
                    row_index: index + 1,
                    message: e.to_string(),
                }),
            }
        }
        report
    }

    fn apply(&mut self, transaction: &Transaction) -> Result<()> {
        if transaction.signed_quantity.is_zero() || transaction.price <= Decimal::ZERO {
            return Err(CalculatorError::InvalidTransaction(format!(
                "{} on {}: quantity {} at {}",
                transaction.symbol, transaction.date, transaction.signed_quantity, transaction.price
            ))
            .into());
        }

        let position = self
            .positions
            .entry(transaction.symbol.clone())
            .or_insert_with(|| {
                Position::new(transaction.symbol.clone(), transaction.currency.clone())
            });

        if transaction.signed_quantity > Decimal::ZERO {
            Self::apply_buy(position, transaction.signed_quantity, transaction.price);
        } else {
            Self::apply_sell(
                position,
                -transaction.signed_quantity,
                transaction.price,
                self.policy,
            )?;
        }
        debug!(
            "{} {} {} @ {} -> qty {} avg {}",
            transaction.symbol,
            if transaction.signed_quantity > Decimal::ZERO {
                "buy"
            } else {
                "sell"
            },
            transaction.signed_quantity.abs(),
            transaction.price,
            position.quantity,
            position.avg_cost
        );
        Ok(())
    }

    fn apply_buy(position: &mut Position, quantity: Decimal, price: Decimal) {
        if position.quantity >= Decimal::ZERO {
            let total_cost = position.quantity * position.avg_cost + quantity * price;
            let total_quantity = position.quantity + quantity;
            position.avg_cost = (total_cost / total_quantity).round_dp(DECIMAL_PRECISION);
            position.quantity = total_quantity;
            return;
        }
        // Buying against a short covers it first.
        let covered = quantity.min(-position.quantity);
        position.realized_pnl += covered * (position.avg_cost - price);
        position.quantity += covered;
        let remainder = quantity - covered;
        if remainder > Decimal::ZERO {
            position.quantity = remainder;
            position.avg_cost = price;
        } else if position.quantity.is_zero() {
            position.avg_cost = Decimal::ZERO;
        }
    }

    fn apply_sell(
        position: &mut Position,
        quantity: Decimal,
        price: Decimal,
        policy: ShortSalePolicy,
    ) -> Result<()> {
        let held = position.quantity.max(Decimal::ZERO);
        if quantity > held && policy == ShortSalePolicy::Reject {
            return Err(CalculatorError::InsufficientQuantity {
                symbol: position.symbol.clone(),
                held: position.quantity,
                requested: quantity,
            }
            .into());
        }

        let closed = quantity.min(held);
        if closed > Decimal::ZERO {
            position.realized_pnl += closed * (price - position.avg_cost);
            position.quantity -= closed;
        }
        let short_opened = quantity - closed;
        if short_opened > Decimal::ZERO {
            // Uncovered portion opens (or extends) a short at the sell price.
            let prior_short = -position.quantity.min(Decimal::ZERO);
            let total_short = prior_short + short_opened;
            position.avg_cost = ((prior_short * position.avg_cost + short_opened * price)
                / total_short)
                .round_dp(DECIMAL_PRECISION);
            position.quantity -= short_opened;
        } else if position.quantity.is_zero() {
            position.avg_cost = Decimal::ZERO;
        }
        Ok(())
    }

    /// Current position for a symbol, if any transactions touched it.
    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    /// Open positions, sorted by symbol.
    pub fn open_positions(&self) -> Vec<&Position> {
        let mut open: Vec<&Position> = self.positions.values().filter(|p| p.is_open()).collect();
        open.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        open
    }

    pub fn total_realized_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }

    /// Values every open position against the price cache as of a date.
    ///
    /// A symbol without any cached price fails with `MissingPrice`; a price
    /// older than the as-of date is used but flagged stale.
    pub fn valuations(
        &self,
        store: &Arc<dyn PriceStore>,
        as_of: NaiveDate,
    ) -> Result<Vec<PositionValuation>> {
        let mut valuations = Vec::new();
        for position in self.open_positions() {
            let cached = resolve_price(store.as_ref(), &position.symbol, as_of)?.ok_or_else(
                || CalculatorError::MissingPrice {
                    symbol: position.symbol.clone(),
                    date: as_of,
                },
            )?;
            let market_value = position.quantity * cached.price;
            let unrealized_pnl = position.quantity * (cached.price - position.avg_cost);
            valuations.push(PositionValuation {
                position: position.clone(),
                price: cached.price,
                price_date: cached.date,
                price_stale: cached.stale,
                market_value,
                unrealized_pnl,
            });
        }
        Ok(valuations)
    }
}
