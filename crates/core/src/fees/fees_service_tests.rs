use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::fees_model::{FeeStatus, FeeType};
use super::fees_service::FeeEngine;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_full_year_management_and_performance_fees() {
    let mut engine = FeeEngine::new().with_high_water_mark(dec!(1000000.00));
    // 365-day period.
    let records = engine
        .calculate(
            date(2023, 1, 1),
            date(2024, 1, 1),
            Some(dec!(1000000.00)),
            Some(dec!(1200000.00)),
        )
        .unwrap();

    assert_eq!(records.len(), 2);
    let management = &records[0];
    assert_eq!(management.fee_type, FeeType::Management);
    assert_eq!(management.amount, dec!(24000.00));

    let performance = &records[1];
    assert_eq!(performance.fee_type, FeeType::Performance);
    assert_eq!(performance.amount, dec!(40000.00));

    assert_eq!(engine.high_water_mark(), dec!(1200000.00));
}

#[test]
fn test_no_performance_fee_below_high_water_mark() {
    let mut engine = FeeEngine::new().with_high_water_mark(dec!(1200000.00));
    let records = engine
        .calculate(
            date(2024, 1, 1),
            date(2024, 7, 1),
            Some(dec!(1100000.00)),
            Some(dec!(1150000.00)),
        )
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fee_type, FeeType::Management);
    // The mark does not move without a performance calculation.
    assert_eq!(engine.high_water_mark(), dec!(1200000.00));
}

#[test]
fn test_high_water_mark_never_decreases() {
    let mut engine = FeeEngine::new();
    let navs = [
        (dec!(1000000), dec!(1200000)),
        (dec!(1200000), dec!(900000)),
        (dec!(900000), dec!(1100000)),
        (dec!(1100000), dec!(1300000)),
    ];
    let mut previous_hwm = engine.high_water_mark();
    let mut start = date(2023, 1, 1);
    for (nav_start, nav_end) in navs {
        let end = start + chrono::Duration::days(90);
        engine
            .calculate(start, end, Some(nav_start), Some(nav_end))
            .unwrap();
        assert!(engine.high_water_mark() >= previous_hwm);
        previous_hwm = engine.high_water_mark();
        start = end;
    }
    assert_eq!(engine.high_water_mark(), dec!(1300000));
}

#[test]
fn test_performance_charges_only_gain_above_mark() {
    let mut engine = FeeEngine::new().with_high_water_mark(dec!(1200000.00));
    let records = engine
        .calculate(
            date(2024, 1, 1),
            date(2024, 7, 1),
            Some(dec!(900000.00)),
            Some(dec!(1250000.00)),
        )
        .unwrap();

    let performance = records
        .iter()
        .find(|r| r.fee_type == FeeType::Performance)
        .unwrap();
    // 20% of (1_250_000 - 1_200_000), not of the full period gain.
    assert_eq!(performance.amount, dec!(10000.00));
}

#[test]
fn test_missing_nav_is_a_precondition_failure() {
    let mut engine = FeeEngine::new();
    assert!(engine
        .calculate(date(2024, 1, 1), date(2024, 7, 1), None, Some(dec!(1)))
        .is_err());
    assert!(engine
        .calculate(date(2024, 1, 1), date(2024, 7, 1), Some(dec!(1)), None)
        .is_err());
    assert!(engine.records().is_empty());
}

#[test]
fn test_scheduled_fee_is_filled_by_calculation() {
    let mut engine = FeeEngine::new().with_high_water_mark(dec!(1000000.00));
    let scheduled = engine.schedule(FeeType::Management, date(2023, 1, 1), date(2024, 1, 1));
    assert_eq!(scheduled.status, FeeStatus::Pending);
    assert_eq!(scheduled.amount, dec!(0));

    // Paying before the period is calculated must fail.
    assert!(engine.mark_paid(&scheduled.id, date(2024, 1, 15)).is_err());

    let records = engine
        .calculate(
            date(2023, 1, 1),
            date(2024, 1, 1),
            Some(dec!(1000000.00)),
            Some(dec!(1200000.00)),
        )
        .unwrap();

    // The scheduled record was filled in place, not duplicated.
    let management = &records[0];
    assert_eq!(management.id, scheduled.id);
    assert_eq!(management.status, FeeStatus::Calculated);
    assert_eq!(management.amount, dec!(24000.00));
    assert_eq!(
        engine
            .records()
            .iter()
            .filter(|r| r.fee_type == FeeType::Management)
            .count(),
        1
    );

    engine.mark_paid(&scheduled.id, date(2024, 1, 15)).unwrap();
    let record = engine.records().iter().find(|r| r.id == scheduled.id).unwrap();
    assert_eq!(record.status, FeeStatus::Paid);
}

#[test]
fn test_pending_fee_is_not_outstanding() {
    let mut engine = FeeEngine::new();
    engine.schedule(FeeType::Management, date(2024, 1, 1), date(2024, 7, 1));
    assert_eq!(engine.outstanding(date(2024, 12, 31)), dec!(0));
}

#[test]
fn test_mark_paid_is_terminal() {
    let mut engine = FeeEngine::new();
    let records = engine
        .calculate(
            date(2023, 1, 1),
            date(2024, 1, 1),
            Some(dec!(1000000.00)),
            Some(dec!(1200000.00)),
        )
        .unwrap();
    let id = records[0].id.clone();

    engine.mark_paid(&id, date(2024, 1, 15)).unwrap();
    let record = engine.records().iter().find(|r| r.id == id).unwrap();
    assert_eq!(record.status, FeeStatus::Paid);
    assert_eq!(record.payment_date, Some(date(2024, 1, 15)));

    // Second payment must fail loudly, not succeed silently.
    assert!(engine.mark_paid(&id, date(2024, 2, 1)).is_err());
    assert!(engine.mark_paid("no-such-record", date(2024, 2, 1)).is_err());
}

#[test]
fn test_outstanding_and_summary() {
    let mut engine = FeeEngine::new();
    let records = engine
        .calculate(
            date(2023, 1, 1),
            date(2024, 1, 1),
            Some(dec!(1000000.00)),
            Some(dec!(1200000.00)),
        )
        .unwrap();

    assert_eq!(engine.outstanding(date(2024, 1, 1)), dec!(64000.00));
    // Fees for periods ending after the query date are not yet owed.
    assert_eq!(engine.outstanding(date(2023, 6, 1)), dec!(0));

    engine.mark_paid(&records[0].id, date(2024, 1, 15)).unwrap();
    let summary = engine.summary();
    assert_eq!(summary.management_total, dec!(24000.00));
    assert_eq!(summary.performance_total, dec!(40000.00));
    assert_eq!(summary.paid, dec!(24000.00));
    assert_eq!(summary.outstanding, dec!(40000.00));
}
