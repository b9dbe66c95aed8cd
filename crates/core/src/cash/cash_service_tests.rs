use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::cash_model::{CashFlow, CashFlowType, InvestorStatus};
use super::cash_service::CashLedger;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn flow(
    investor_id: &str,
    d: NaiveDate,
    flow_type: CashFlowType,
    amount: rust_decimal::Decimal,
) -> CashFlow {
    CashFlow {
        date: d,
        investor_id: investor_id.to_string(),
        flow_type,
        amount,
        currency: "BRL".to_string(),
        amount_in_base_currency: amount,
        description: None,
    }
}

fn seeded_ledger() -> CashLedger {
    let mut ledger = CashLedger::new();
    ledger.register_investor("inv-1", "Ana");
    ledger.register_investor("inv-2", "Bruno");
    ledger
        .add_cash_flow(flow("inv-1", date(2024, 1, 5), CashFlowType::Deposit, dec!(100000)))
        .unwrap();
    ledger
        .add_cash_flow(flow("inv-2", date(2024, 1, 10), CashFlowType::Deposit, dec!(50000)))
        .unwrap();
    ledger
        .add_cash_flow(flow("inv-1", date(2024, 2, 1), CashFlowType::Withdrawal, dec!(25000)))
        .unwrap();
    ledger
}

#[test]
fn test_cash_position_sums_flows_up_to_date() {
    let ledger = seeded_ledger();
    assert_eq!(ledger.cash_position(date(2024, 1, 7)), dec!(100000));
    assert_eq!(ledger.cash_position(date(2024, 1, 31)), dec!(150000));
    assert_eq!(ledger.cash_position(date(2024, 2, 28)), dec!(125000));
}

#[test]
fn test_net_contribution_and_stake() {
    let ledger = seeded_ledger();
    let as_of = date(2024, 2, 28);

    assert_eq!(ledger.net_contribution("inv-1", as_of), dec!(75000));
    assert_eq!(ledger.net_contribution("inv-2", as_of), dec!(50000));
    assert_eq!(ledger.stake_pct("inv-1", as_of).unwrap(), dec!(0.6));
    assert_eq!(ledger.stake_pct("inv-2", as_of).unwrap(), dec!(0.4));
}

#[test]
fn test_stakes_sum_to_one() {
    let ledger = seeded_ledger();
    let contributions = ledger.contributions(date(2024, 2, 28));
    let total: rust_decimal::Decimal = contributions.iter().map(|c| c.stake_pct).sum();
    assert_eq!(total, dec!(1));
}

#[test]
fn test_first_investment_date_per_investor() {
    let ledger = seeded_ledger();

    let contributions = ledger.contributions(date(2024, 2, 28));
    let ana = contributions.iter().find(|c| c.investor_id == "inv-1").unwrap();
    let bruno = contributions.iter().find(|c| c.investor_id == "inv-2").unwrap();
    assert_eq!(ana.first_investment_date, Some(date(2024, 1, 5)));
    assert_eq!(bruno.first_investment_date, Some(date(2024, 1, 10)));

    // Before Bruno's first deposit he is registered but not yet invested.
    let early = ledger.contributions(date(2024, 1, 7));
    let bruno = early.iter().find(|c| c.investor_id == "inv-2").unwrap();
    assert_eq!(bruno.first_investment_date, None);
}

#[test]
fn test_stake_without_contributions_errors() {
    let ledger = CashLedger::new();
    assert!(ledger.stake_pct("inv-1", date(2024, 1, 1)).is_err());
}

#[test]
fn test_rejects_non_positive_amounts() {
    let mut ledger = CashLedger::new();
    let result = ledger.add_cash_flow(flow(
        "inv-1",
        date(2024, 1, 5),
        CashFlowType::Deposit,
        dec!(0),
    ));
    assert!(result.is_err());
    assert!(ledger.flows().is_empty());
}

#[test]
fn test_unknown_investor_is_registered_on_first_flow() {
    let mut ledger = CashLedger::new();
    ledger
        .add_cash_flow(flow("inv-9", date(2024, 1, 5), CashFlowType::Deposit, dec!(10)))
        .unwrap();
    assert!(ledger.investor("inv-9").is_some());
}

#[test]
fn test_status_transitions() {
    let mut ledger = seeded_ledger();
    ledger
        .set_investor_status("inv-2", InvestorStatus::Inactive)
        .unwrap();
    assert_eq!(
        ledger.investor("inv-2").unwrap().status,
        InvestorStatus::Inactive
    );
    assert!(ledger
        .set_investor_status("missing", InvestorStatus::Inactive)
        .is_err());
}
