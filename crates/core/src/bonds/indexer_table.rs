use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use std::collections::{BTreeMap, HashMap};

use super::bonds_model::Indexer;
use crate::quotes::IndexerObservation;

/// Monthly indexer observations keyed by `(year, month)`.
///
/// Values are monthly percentages as published by the central bank
/// (`0.53` means 0.53% for that month).
#[derive(Default)]
pub struct IndexerTable {
    series: HashMap<Indexer, BTreeMap<(i32, u32), Decimal>>,
}

impl IndexerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, indexer: Indexer, observations: Vec<IndexerObservation>) {
        let table = self.series.entry(indexer).or_default();
        for obs in observations {
            table.insert((obs.date.year(), obs.date.month()), obs.value);
        }
    }

    /// Published monthly percentage for one month, if available.
    pub fn monthly_rate(&self, indexer: Indexer, year: i32, month: u32) -> Option<Decimal> {
        self.series
            .get(&indexer)
            .and_then(|t| t.get(&(year, month)))
            .copied()
    }

    pub fn has_series(&self, indexer: Indexer) -> bool {
        self.series
            .get(&indexer)
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }
}

/// Monthly rate (as a fraction) equivalent to an annual rate (as a fraction).
pub fn monthly_equivalent(annual_rate: Decimal) -> Decimal {
    (Decimal::ONE + annual_rate).powd(Decimal::ONE / Decimal::from(12)) - Decimal::ONE
}

/// Calendar months `(year, month)` whose first day lies in `(start, end]`.
///
/// This is the accrual grid: a bond applied mid-month starts compounding at
/// the first month boundary after application, up to and including the
/// month containing the query date.
pub fn accrual_months(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let mut year = start.year();
    let mut month = start.month();
    loop {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
        let first = match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(d) => d,
            None => break,
        };
        if first > end {
            break;
        }
        months.push((year, month));
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_accrual_months_spans_year_boundary() {
        let months = accrual_months(date(2023, 11, 15), date(2024, 2, 10));
        assert_eq!(months, vec![(2023, 12), (2024, 1), (2024, 2)]);
    }

    #[test]
    fn test_accrual_months_empty_within_same_month() {
        assert!(accrual_months(date(2024, 1, 5), date(2024, 1, 25)).is_empty());
    }

    #[test]
    fn test_monthly_equivalent_of_five_percent() {
        let monthly = monthly_equivalent(dec!(0.05));
        // (1 + m)^12 should land back on 1.05.
        let compounded = (Decimal::ONE + monthly).powd(dec!(12));
        assert!((compounded - dec!(1.05)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_table_lookup() {
        let mut table = IndexerTable::new();
        table.load(
            Indexer::Ipca,
            vec![IndexerObservation {
                date: date(2024, 1, 1),
                value: dec!(0.42),
            }],
        );
        assert_eq!(table.monthly_rate(Indexer::Ipca, 2024, 1), Some(dec!(0.42)));
        assert_eq!(table.monthly_rate(Indexer::Ipca, 2024, 2), None);
        assert!(table.has_series(Indexer::Ipca));
        assert!(!table.has_series(Indexer::Cdi));
    }
}
