//! Database models for the price-history cache.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use fundfolio_core::quotes::{PriceBar, SymbolMetadata};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database model for daily price bars.
///
/// Numeric columns are stored as text to preserve decimal precision in
/// SQLite.
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    Debug,
    Clone,
    Serialize,
    Deserialize,
    PartialEq,
)]
#[diesel(table_name = crate::schema::price_history)]
#[diesel(primary_key(symbol, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct PriceBarDB {
    pub symbol: String,
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub adj_close: String,
    pub volume: String,
    pub dividend: String,
    pub split: String,
}

/// Database model for per-symbol cache coverage.
#[derive(
    Queryable,
    Identifiable,
    Selectable,
    Insertable,
    AsChangeset,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::symbol_metadata)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SymbolMetadataDB {
    pub symbol: String,
    pub first_date: String,
    pub last_date: String,
    pub last_updated: String,
    pub total_records: i64,
}

// Conversion implementations

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap_or_default()
}

impl From<PriceBarDB> for PriceBar {
    fn from(db: PriceBarDB) -> Self {
        let parse_decimal = |s: &str| Decimal::from_str(s).unwrap_or_default();

        PriceBar {
            symbol: db.symbol,
            date: parse_date(&db.date),
            open: parse_decimal(&db.open),
            high: parse_decimal(&db.high),
            low: parse_decimal(&db.low),
            close: parse_decimal(&db.close),
            adj_close: parse_decimal(&db.adj_close),
            volume: parse_decimal(&db.volume),
            dividend: parse_decimal(&db.dividend),
            split: parse_decimal(&db.split),
        }
    }
}

impl From<&PriceBar> for PriceBarDB {
    fn from(bar: &PriceBar) -> Self {
        PriceBarDB {
            symbol: bar.symbol.clone(),
            date: bar.date.format(DATE_FORMAT).to_string(),
            open: bar.open.to_string(),
            high: bar.high.to_string(),
            low: bar.low.to_string(),
            close: bar.close.to_string(),
            adj_close: bar.adj_close.to_string(),
            volume: bar.volume.to_string(),
            dividend: bar.dividend.to_string(),
            split: bar.split.to_string(),
        }
    }
}

impl From<SymbolMetadataDB> for SymbolMetadata {
    fn from(db: SymbolMetadataDB) -> Self {
        SymbolMetadata {
            symbol: db.symbol,
            first_date: parse_date(&db.first_date),
            last_date: parse_date(&db.last_date),
            last_updated: DateTime::parse_from_rfc3339(&db.last_updated)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            total_records: db.total_records,
        }
    }
}

impl From<&SymbolMetadata> for SymbolMetadataDB {
    fn from(meta: &SymbolMetadata) -> Self {
        SymbolMetadataDB {
            symbol: meta.symbol.clone(),
            first_date: meta.first_date.format(DATE_FORMAT).to_string(),
            last_date: meta.last_date.format(DATE_FORMAT).to_string(),
            last_updated: meta.last_updated.to_rfc3339(),
            total_records: meta.total_records,
        }
    }
}
