use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::fees_errors::FeeError;
use super::fees_model::{FeeRecord, FeeStatus, FeeSummary, FeeType};
use crate::constants::{
    DAYS_PER_YEAR, DEFAULT_MANAGEMENT_FEE_RATE, DEFAULT_PERFORMANCE_FEE_RATE, MONEY_PRECISION,
};
use crate::errors::Result;

/// Fund-level fee waterfall with a monotonic high-water mark.
///
/// Management fee accrues pro-rata on the period's opening NAV; the
/// performance fee charges only the gain above the high-water mark, which
/// never decreases and moves only after a performance calculation.
pub struct FeeEngine {
    management_rate: Decimal,
    performance_rate: Decimal,
    high_water_mark: Decimal,
    records: Vec<FeeRecord>,
}

impl Default for FeeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FeeEngine {
    pub fn new() -> Self {
        Self {
            management_rate: DEFAULT_MANAGEMENT_FEE_RATE,
            performance_rate: DEFAULT_PERFORMANCE_FEE_RATE,
            high_water_mark: Decimal::ZERO,
            records: Vec::new(),
        }
    }

    pub fn with_rates(mut self, management: Decimal, performance: Decimal) -> Self {
        self.management_rate = management;
        self.performance_rate = performance;
        self
    }

    /// Seeds the high-water mark, e.g. from the fund's opening NAV.
    pub fn with_high_water_mark(mut self, hwm: Decimal) -> Self {
        self.high_water_mark = hwm;
        self
    }

    pub fn high_water_mark(&self) -> Decimal {
        self.high_water_mark
    }

    pub fn records(&self) -> &[FeeRecord] {
        &self.records
    }

    /// Opens a Pending record for an upcoming period, before its NAVs
    /// exist. A later `calculate` over the same period fills it in.
    pub fn schedule(
        &mut self,
        fee_type: FeeType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> FeeRecord {
        let rate = match fee_type {
            FeeType::Management => self.management_rate,
            FeeType::Performance => self.performance_rate,
        };
        let record = FeeRecord {
            id: Uuid::new_v4().to_string(),
            fee_type,
            period_start,
            period_end,
            nav_start: Decimal::ZERO,
            nav_end: Decimal::ZERO,
            rate,
            amount: Decimal::ZERO,
            status: FeeStatus::Pending,
            payment_date: None,
        };
        self.records.push(record.clone());
        record
    }

    /// Calculates management and performance fees for one period.
    ///
    /// NAVs at both boundaries must exist; calculation on an undefined NAV
    /// is a precondition failure, not a zero fee. Returns the records
    /// appended to the ledger (performance may be absent when the closing
    /// NAV did not beat the high-water mark).
    pub fn calculate(
        &mut self,
        period_start: NaiveDate,
        period_end: NaiveDate,
        nav_start: Option<Decimal>,
        nav_end: Option<Decimal>,
    ) -> Result<Vec<FeeRecord>> {
        let nav_start = nav_start.ok_or_else(|| {
            FeeError::Precondition(format!("no NAV at period start {}", period_start))
        })?;
        let nav_end = nav_end.ok_or_else(|| {
            FeeError::Precondition(format!("no NAV at period end {}", period_end))
        })?;
        if period_end <= period_start {
            return Err(FeeError::Precondition(format!(
                "period end {} not after start {}",
                period_end, period_start
            ))
            .into());
        }

        let mut created = Vec::new();

        let days = Decimal::from((period_end - period_start).num_days());
        let management_amount =
            (nav_start * self.management_rate / DAYS_PER_YEAR * days).round_dp(MONEY_PRECISION);
        created.push(self.append_record(
            FeeType::Management,
            period_start,
            period_end,
            nav_start,
            nav_end,
            self.management_rate,
            management_amount,
        ));

        if nav_end > self.high_water_mark {
            let performance_amount =
                ((nav_end - self.high_water_mark) * self.performance_rate).round_dp(MONEY_PRECISION);
            created.push(self.append_record(
                FeeType::Performance,
                period_start,
                period_end,
                nav_start,
                nav_end,
                self.performance_rate,
                performance_amount,
            ));
            // The mark only ratchets upward, and only here.
            self.high_water_mark = self.high_water_mark.max(nav_end);
            debug!("high-water mark moved to {}", self.high_water_mark);
        }

        Ok(created)
    }

    /// Fills a matching Pending record if one was scheduled for the period,
    /// otherwise appends a new record, either way ending in Calculated.
    #[allow(clippy::too_many_arguments)]
    fn append_record(
        &mut self,
        fee_type: FeeType,
        period_start: NaiveDate,
        period_end: NaiveDate,
        nav_start: Decimal,
        nav_end: Decimal,
        rate: Decimal,
        amount: Decimal,
    ) -> FeeRecord {
        if let Some(record) = self.records.iter_mut().find(|r| {
            r.status == FeeStatus::Pending
                && r.fee_type == fee_type
                && r.period_start == period_start
                && r.period_end == period_end
        }) {
            record.nav_start = nav_start;
            record.nav_end = nav_end;
            record.rate = rate;
            record.amount = amount;
            record.status = FeeStatus::Calculated;
            return record.clone();
        }

        let record = FeeRecord {
            id: Uuid::new_v4().to_string(),
            fee_type,
            period_start,
            period_end,
            nav_start,
            nav_end,
            rate,
            amount,
            status: FeeStatus::Calculated,
            payment_date: None,
        };
        self.records.push(record.clone());
        record
    }

    /// Transitions a Calculated record to Paid. Paying twice, or paying a
    /// record that was never calculated, is an error.
    pub fn mark_paid(&mut self, record_id: &str, payment_date: NaiveDate) -> Result<()> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| FeeError::NotFound(record_id.to_string()))?;
        match record.status {
            FeeStatus::Paid => Err(FeeError::InvalidState(format!(
                "fee record {} already paid on {}",
                record_id,
                record
                    .payment_date
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            ))
            .into()),
            FeeStatus::Pending => Err(FeeError::InvalidState(format!(
                "fee record {} not yet calculated",
                record_id
            ))
            .into()),
            FeeStatus::Calculated => {
                record.status = FeeStatus::Paid;
                record.payment_date = Some(payment_date);
                Ok(())
            }
        }
    }

    /// Sum of unpaid fees calculated for periods ending at or before a date.
    pub fn outstanding(&self, as_of: NaiveDate) -> Decimal {
        self.records
            .iter()
            .filter(|r| r.status == FeeStatus::Calculated && r.period_end <= as_of)
            .map(|r| r.amount)
            .sum()
    }

    pub fn summary(&self) -> FeeSummary {
        let mut summary = FeeSummary::default();
        for record in &self.records {
            match record.fee_type {
                FeeType::Management => summary.management_total += record.amount,
                FeeType::Performance => summary.performance_total += record.amount,
            }
            if record.is_paid() {
                summary.paid += record.amount;
            } else {
                summary.outstanding += record.amount;
            }
        }
        summary
    }
}
