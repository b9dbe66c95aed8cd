use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::aggregator_service::PortfolioAggregator;
use crate::bonds::{BondIndexationEngine, BondPosition, Indexer, IndexerTable};
use crate::cash::{CashFlow, CashFlowType};
use crate::fees::FeeEngine;
use crate::ledger::{AssetClass, Transaction};
use crate::quotes::{IndexerObservation, MemoryPriceStore, PriceBar, PriceStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bar(symbol: &str, d: NaiveDate, close: Decimal) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        date: d,
        close,
        adj_close: close,
        split: dec!(1),
        ..Default::default()
    }
}

fn tx(
    asset_class: AssetClass,
    symbol: &str,
    currency: &str,
    d: NaiveDate,
    qty: Decimal,
    price: Decimal,
) -> Transaction {
    Transaction {
        asset_class,
        symbol: symbol.to_string(),
        date: d,
        signed_quantity: qty,
        price,
        currency: currency.to_string(),
        market: None,
    }
}

fn deposit(investor: &str, d: NaiveDate, amount: Decimal) -> CashFlow {
    CashFlow {
        date: d,
        investor_id: investor.to_string(),
        flow_type: CashFlowType::Deposit,
        amount,
        currency: "BRL".to_string(),
        amount_in_base_currency: amount,
        description: None,
    }
}

async fn seeded_aggregator() -> PortfolioAggregator {
    let store = Arc::new(MemoryPriceStore::new());
    store
        .upsert_bars(&[
            bar("PETR4.SA", date(2024, 3, 28), dec!(35.00)),
            bar("BTC-USD", date(2024, 3, 28), dec!(50000.00)),
            bar("USDBRL=X", date(2024, 3, 28), dec!(5.00)),
            bar("^BVSP", date(2024, 3, 28), dec!(128000)),
            bar("^BVSP", date(2024, 3, 29), dec!(129000)),
            bar("^BVSP", date(2024, 4, 1), dec!(127500)),
        ])
        .await
        .unwrap();

    let mut indexers = IndexerTable::new();
    indexers.load(
        Indexer::Cdi,
        vec![
            IndexerObservation {
                date: date(2024, 2, 1),
                value: dec!(1.00),
            },
            IndexerObservation {
                date: date(2024, 3, 1),
                value: dec!(1.00),
            },
        ],
    );

    let mut aggregator = PortfolioAggregator::new(
        "BRL",
        store.clone() as Arc<dyn PriceStore>,
        BondIndexationEngine::new(indexers),
        FeeEngine::new(),
        dec!(0),
    );

    aggregator.ledger_mut(AssetClass::Equity).replay(&[tx(
        AssetClass::Equity,
        "PETR4.SA",
        "BRL",
        date(2024, 1, 2),
        dec!(100),
        dec!(30.00),
    )]);
    aggregator.ledger_mut(AssetClass::Crypto).replay(&[tx(
        AssetClass::Crypto,
        "BTC-USD",
        "USD",
        date(2024, 1, 2),
        dec!(0.5),
        dec!(40000.00),
    )]);

    aggregator.add_bonds(vec![BondPosition {
        issue_id: "cdb-1".to_string(),
        title: "CDB Banco X".to_string(),
        issuer: "Banco X".to_string(),
        indexer: Indexer::Cdi,
        percent_indexed: dec!(100),
        quantity: dec!(1),
        unit_price: dec!(10000.00),
        principal: dec!(10000.00),
        issue_date: date(2024, 1, 15),
        maturity_date: date(2026, 1, 15),
        currency: "BRL".to_string(),
    }]);

    let cash = aggregator.cash_mut();
    cash.register_investor("inv-1", "Ana");
    cash.register_investor("inv-2", "Bruno");
    cash.add_cash_flow(deposit("inv-1", date(2024, 1, 5), dec!(100000)))
        .unwrap();
    cash.add_cash_flow(deposit("inv-2", date(2024, 1, 5), dec!(50000)))
        .unwrap();

    aggregator
}

#[tokio::test]
async fn test_nav_snapshot_identity() {
    let aggregator = seeded_aggregator().await;
    let snapshot = aggregator.nav_snapshot(date(2024, 3, 29)).unwrap();

    // 100 * 35 BRL + 0.5 * 50_000 USD * 5 + 10_000 * 1.01^2 + 150_000 cash
    assert_eq!(snapshot.portfolio_value, dec!(138701.00));
    assert_eq!(snapshot.cash_position, dec!(150000));
    assert_eq!(snapshot.outstanding_fees, dec!(0));
    assert_eq!(snapshot.nav, dec!(288701.00));
    assert_eq!(
        snapshot.nav,
        snapshot.portfolio_value + snapshot.cash_position - snapshot.outstanding_fees
    );
    assert!(!snapshot.approximate);
}

#[tokio::test]
async fn test_outstanding_fees_reduce_nav() {
    let mut aggregator = seeded_aggregator().await;
    let before = aggregator.nav_snapshot(date(2024, 3, 29)).unwrap();

    let records = aggregator
        .calculate_fees(date(2024, 1, 2), date(2024, 3, 29))
        .unwrap();
    assert!(!records.is_empty());

    let after = aggregator.nav_snapshot(date(2024, 3, 29)).unwrap();
    assert!(after.outstanding_fees > dec!(0));
    assert_eq!(after.nav, before.nav - after.outstanding_fees);

    aggregator
        .mark_fee_paid(&records[0].id, date(2024, 4, 1))
        .unwrap();
    let paid = aggregator.nav_snapshot(date(2024, 3, 29)).unwrap();
    assert!(paid.outstanding_fees < after.outstanding_fees);
}

#[tokio::test]
async fn test_consolidated_summary_allocation_and_rates() {
    let aggregator = seeded_aggregator().await;
    let summary = aggregator.consolidated_summary(date(2024, 3, 29)).unwrap();

    assert_eq!(summary.base_currency, "BRL");
    assert_eq!(summary.total_value, dec!(288701.00));
    // 500 equity + 25_000 crypto (in BRL) + 201 bond gain
    assert_eq!(summary.total_pnl, dec!(25701.00));

    let share_total: Decimal = summary.allocation.iter().map(|s| s.share).sum();
    assert!((share_total - dec!(1)).abs() < dec!(0.0001));
    assert!(summary.allocation.iter().any(|s| s.label == "EQUITY"));
    assert!(summary.allocation.iter().any(|s| s.label == "FIXED_INCOME"));
    assert!(summary.allocation.iter().any(|s| s.label == "CASH"));

    assert_eq!(summary.exchange_rates.len(), 1);
    assert_eq!(summary.exchange_rates[0].from_currency, "USD");
    assert_eq!(summary.exchange_rates[0].rate, dec!(5.00));
}

#[tokio::test]
async fn test_investor_allocations_conserve_nav() {
    let aggregator = seeded_aggregator().await;
    let snapshot = aggregator.nav_snapshot(date(2024, 3, 29)).unwrap();
    let allocations = aggregator.investor_allocations(date(2024, 3, 29)).unwrap();

    assert_eq!(allocations.len(), 2);
    let total: Decimal = allocations.iter().map(|a| a.investor_nav).sum();
    assert!((total - snapshot.nav).abs() < dec!(0.01));

    let ana = allocations
        .iter()
        .find(|a| a.investor_id == "inv-1")
        .unwrap();
    assert_eq!(ana.net_contribution, dec!(100000));
    assert!(ana.unrealized_gain > dec!(0));
}

#[tokio::test]
async fn test_performance_payload_with_benchmark() {
    let aggregator = seeded_aggregator().await;

    let dates = vec![date(2024, 3, 28), date(2024, 3, 29), date(2024, 4, 1)];
    let payload = aggregator
        .performance_payload(&dates, Some("^BVSP"))
        .unwrap();

    assert_eq!(payload.nav_series.len(), 3);
    // Flat prices after 3/28 mean a flat NAV series.
    assert_eq!(payload.risk_metrics.total_return, dec!(0));
    assert!(payload.drawdown_episodes.is_empty());

    let benchmark = payload.benchmark.unwrap();
    assert_eq!(benchmark.benchmark_symbol, "^BVSP");
    assert_eq!(benchmark.aligned_days, 2);

    let without = aggregator.performance_payload(&dates, None).unwrap();
    assert!(without.benchmark.is_none());
}

#[tokio::test]
async fn test_nav_series_skips_unpriceable_dates() {
    let store = Arc::new(MemoryPriceStore::new());
    let mut aggregator = PortfolioAggregator::new(
        "BRL",
        store.clone() as Arc<dyn PriceStore>,
        BondIndexationEngine::new(IndexerTable::new()),
        FeeEngine::new(),
        dec!(0),
    );
    aggregator.ledger_mut(AssetClass::Equity).replay(&[tx(
        AssetClass::Equity,
        "PETR4.SA",
        "BRL",
        date(2024, 1, 2),
        dec!(100),
        dec!(30.00),
    )]);

    // No prices cached at all: every date is skipped, not an error.
    let series = aggregator.nav_series(&[date(2024, 1, 5), date(2024, 1, 6)]);
    assert!(series.is_empty());
}
