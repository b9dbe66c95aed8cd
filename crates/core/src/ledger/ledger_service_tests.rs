use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::ledger_model::{AssetClass, ShortSalePolicy, Transaction};
use super::ledger_service::PositionLedger;
use crate::quotes::{MemoryPriceStore, PriceBar, PriceStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn tx(symbol: &str, d: NaiveDate, qty: rust_decimal::Decimal, price: rust_decimal::Decimal) -> Transaction {
    Transaction {
        asset_class: AssetClass::Equity,
        symbol: symbol.to_string(),
        date: d,
        signed_quantity: qty,
        price,
        currency: "BRL".to_string(),
        market: Some("B3".to_string()),
    }
}

#[test]
fn test_buy_then_partial_sell_books_realized_pnl() {
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    let report = ledger.replay(&[
        tx("KLBN11.SA", date(2024, 1, 5), dec!(1500), dec!(14.15)),
        tx("KLBN11.SA", date(2024, 2, 1), dec!(-100), dec!(15.60)),
    ]);
    assert!(report.is_clean());

    let position = ledger.position("KLBN11.SA").unwrap();
    assert_eq!(position.quantity, dec!(1400));
    assert_eq!(position.avg_cost, dec!(14.15));
    assert_eq!(position.realized_pnl, dec!(145.00));
}

#[test]
fn test_avg_cost_is_quantity_weighted_and_order_independent() {
    let buys = [
        tx("PETR4.SA", date(2024, 1, 2), dec!(100), dec!(30.00)),
        tx("PETR4.SA", date(2024, 1, 3), dec!(300), dec!(34.00)),
        tx("PETR4.SA", date(2024, 1, 4), dec!(100), dec!(38.00)),
    ];
    // (100*30 + 300*34 + 100*38) / 500 = 34.00
    let expected = dec!(34.00);

    let mut forward = PositionLedger::new(AssetClass::Equity);
    forward.replay(&buys);
    assert_eq!(forward.position("PETR4.SA").unwrap().avg_cost, expected);

    let mut reversed = PositionLedger::new(AssetClass::Equity);
    let mut shuffled = buys.to_vec();
    shuffled.reverse();
    reversed.replay(&shuffled);
    assert_eq!(reversed.position("PETR4.SA").unwrap().avg_cost, expected);
}

#[test]
fn test_sell_leaves_avg_cost_unchanged() {
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    ledger.replay(&[
        tx("VALE3.SA", date(2024, 1, 2), dec!(200), dec!(60.00)),
        tx("VALE3.SA", date(2024, 1, 10), dec!(-50), dec!(55.00)),
    ]);

    let position = ledger.position("VALE3.SA").unwrap();
    assert_eq!(position.avg_cost, dec!(60.00));
    assert_eq!(position.realized_pnl, dec!(-250.00));
    assert_eq!(position.quantity, dec!(150));
}

#[test]
fn test_oversell_rejected_as_row_error() {
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    let report = ledger.replay(&[
        tx("ITUB4.SA", date(2024, 1, 2), dec!(100), dec!(28.00)),
        tx("ITUB4.SA", date(2024, 1, 10), dec!(-150), dec!(29.00)),
    ]);

    assert_eq!(report.applied, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row_index, 2);
    // The buy before the rejected sell is kept.
    assert_eq!(ledger.position("ITUB4.SA").unwrap().quantity, dec!(100));
}

#[test]
fn test_replay_continues_past_rejected_rows() {
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    let report = ledger.replay(&[
        tx("ITUB4.SA", date(2024, 1, 2), dec!(100), dec!(28.00)),
        tx("ITUB4.SA", date(2024, 1, 10), dec!(-150), dec!(29.00)),
        tx("ITUB4.SA", date(2024, 1, 15), dec!(50), dec!(30.00)),
    ]);

    // The rejected sell is reported; the later buy still applies.
    assert_eq!(report.applied, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row_index, 2);

    let position = ledger.position("ITUB4.SA").unwrap();
    assert_eq!(position.quantity, dec!(150));
    // (100*28 + 50*30) / 150
    assert_eq!(position.avg_cost, dec!(28.666667));
    assert_eq!(position.realized_pnl, dec!(0));
}

#[test]
fn test_invalid_transaction_reported_not_fatal() {
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    let report = ledger.replay(&[
        tx("PETR4.SA", date(2024, 1, 2), dec!(0), dec!(30.00)),
        tx("PETR4.SA", date(2024, 1, 3), dec!(100), dec!(30.00)),
    ]);

    assert_eq!(report.applied, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row_index, 1);
    assert_eq!(ledger.position("PETR4.SA").unwrap().quantity, dec!(100));
}

#[test]
fn test_oversell_with_short_policy_opens_short() {
    let mut ledger =
        PositionLedger::new(AssetClass::Equity).with_policy(ShortSalePolicy::AllowShort);
    let report = ledger.replay(&[
        tx("ITUB4.SA", date(2024, 1, 2), dec!(100), dec!(28.00)),
        tx("ITUB4.SA", date(2024, 1, 10), dec!(-150), dec!(29.00)),
    ]);
    assert!(report.is_clean());

    let position = ledger.position("ITUB4.SA").unwrap();
    assert_eq!(position.quantity, dec!(-50));
    // Long leg realized: 100 * (29 - 28). Short leg opens at 29.
    assert_eq!(position.realized_pnl, dec!(100.00));
    assert_eq!(position.avg_cost, dec!(29.00));
}

#[test]
fn test_short_cover_realizes_against_short_basis() {
    let mut ledger =
        PositionLedger::new(AssetClass::Equity).with_policy(ShortSalePolicy::AllowShort);
    let report = ledger.replay(&[
        tx("WEGE3.SA", date(2024, 1, 2), dec!(-100), dec!(40.00)),
        tx("WEGE3.SA", date(2024, 1, 20), dec!(100), dec!(36.00)),
    ]);
    assert!(report.is_clean());

    let position = ledger.position("WEGE3.SA").unwrap();
    assert_eq!(position.quantity, dec!(0));
    assert_eq!(position.realized_pnl, dec!(400.00));
    assert!(!position.is_open());
}

#[test]
fn test_replay_ignores_other_asset_classes() {
    let mut ledger = PositionLedger::new(AssetClass::Crypto);
    let mut equity = tx("PETR4.SA", date(2024, 1, 2), dec!(100), dec!(30.00));
    equity.asset_class = AssetClass::Equity;
    let report = ledger.replay(&[equity]);
    assert!(report.is_clean());
    assert_eq!(report.applied, 0);
    assert!(ledger.position("PETR4.SA").is_none());
}

#[tokio::test]
async fn test_valuations_use_latest_cached_price() {
    let store: Arc<dyn PriceStore> = Arc::new(MemoryPriceStore::new());
    store
        .upsert_bars(&[PriceBar {
            symbol: "KLBN11.SA".to_string(),
            date: date(2024, 2, 5),
            close: dec!(16.00),
            adj_close: dec!(16.00),
            split: dec!(1),
            ..Default::default()
        }])
        .await
        .unwrap();

    let mut ledger = PositionLedger::new(AssetClass::Equity);
    ledger.replay(&[tx("KLBN11.SA", date(2024, 1, 5), dec!(1400), dec!(14.15))]);

    let valuations = ledger.valuations(&store, date(2024, 2, 6)).unwrap();
    assert_eq!(valuations.len(), 1);
    assert_eq!(valuations[0].market_value, dec!(22400.00));
    assert_eq!(valuations[0].unrealized_pnl, dec!(1400) * dec!(1.85));
    assert!(!valuations[0].price_stale);
}

#[tokio::test]
async fn test_valuation_missing_price_errors() {
    let store: Arc<dyn PriceStore> = Arc::new(MemoryPriceStore::new());
    let mut ledger = PositionLedger::new(AssetClass::Equity);
    ledger.replay(&[tx("NOPRICE.SA", date(2024, 1, 5), dec!(10), dec!(1.00))]);

    assert!(ledger.valuations(&store, date(2024, 2, 6)).is_err());
}
