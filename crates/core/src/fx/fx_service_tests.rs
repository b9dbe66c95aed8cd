use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::fx_model::ExchangeRate;
use super::fx_service::FxService;
use crate::quotes::{MemoryPriceStore, PriceBar, PriceStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn fx_bar(symbol: &str, d: NaiveDate, close: rust_decimal::Decimal) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        date: d,
        close,
        adj_close: close,
        split: dec!(1),
        ..Default::default()
    }
}

async fn seeded_store() -> Arc<MemoryPriceStore> {
    let store = Arc::new(MemoryPriceStore::new());
    store
        .upsert_bars(&[
            fx_bar("USDBRL=X", date(2024, 1, 10), dec!(4.90)),
            fx_bar("USDBRL=X", date(2024, 1, 20), dec!(5.00)),
            // A non-FX symbol must be ignored by the rate loader.
            fx_bar("PETR4.SA", date(2024, 1, 10), dec!(35.00)),
        ])
        .await
        .unwrap();
    store
}

#[test]
fn test_cache_symbol_round_trip() {
    assert_eq!(ExchangeRate::cache_symbol("USD", "BRL"), "USDBRL=X");
    assert_eq!(
        ExchangeRate::parse_cache_symbol("USDBRL=X"),
        Some(("USD".to_string(), "BRL".to_string()))
    );
    assert_eq!(ExchangeRate::parse_cache_symbol("PETR4.SA"), None);
}

#[tokio::test]
async fn test_convert_uses_cached_series() {
    let service = FxService::new(seeded_store().await);
    let converted = service
        .convert(dec!(100), "USD", "BRL", date(2024, 1, 20))
        .unwrap();
    assert_eq!(converted, dec!(500.00));
}

#[tokio::test]
async fn test_inverse_pair_is_available() {
    let service = FxService::new(seeded_store().await);
    let rate = service.get_rate("BRL", "USD", date(2024, 1, 20)).unwrap();
    assert_eq!(rate, dec!(1) / dec!(5.00));
}

#[tokio::test]
async fn test_same_currency_is_identity_without_rates() {
    let service = FxService::new(Arc::new(MemoryPriceStore::new()));
    assert_eq!(
        service
            .convert(dec!(42), "BRL", "BRL", date(2024, 1, 1))
            .unwrap(),
        dec!(42)
    );
}

#[tokio::test]
async fn test_missing_pair_errors() {
    let service = FxService::new(seeded_store().await);
    assert!(service.get_rate("USD", "JPY", date(2024, 1, 20)).is_err());
}

#[tokio::test]
async fn test_refresh_picks_up_new_rates() {
    let store = seeded_store().await;
    let service = FxService::new(store.clone());
    assert!(service.get_rate("EUR", "BRL", date(2024, 1, 20)).is_err());

    store
        .upsert_bars(&[fx_bar("EURUSD=X", date(2024, 1, 20), dec!(1.10))])
        .await
        .unwrap();
    service.refresh().unwrap();

    let rate = service.get_rate("EUR", "BRL", date(2024, 1, 20)).unwrap();
    assert_eq!(rate, dec!(1.10) * dec!(5.00));
}
