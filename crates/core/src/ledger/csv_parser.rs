//! Transaction CSV ingestion.
//!
//! Expected columns: `date, symbol, price, signed_quantity[, market]`.
//! Invalid rows are rejected individually; the remainder of the file still
//! loads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

use super::ledger_model::{AssetClass, Transaction};
use crate::imports::{read_rows, ImportResult};

#[derive(Debug, Deserialize)]
struct TransactionRow {
    date: String,
    symbol: String,
    price: Decimal,
    signed_quantity: Decimal,
    #[serde(default)]
    market: Option<String>,
}

/// Loads signed transactions from CSV for one asset class.
///
/// `currency` applies to every row; mixed-currency files are split by the
/// caller before import.
pub fn import_transactions<R: Read>(
    reader: R,
    asset_class: AssetClass,
    currency: &str,
) -> ImportResult<Transaction> {
    let mut result = read_rows(reader, |row: TransactionRow| {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {}", row.date, e))?;
        if row.symbol.is_empty() {
            return Err("missing symbol".to_string());
        }
        if row.price <= Decimal::ZERO {
            return Err(format!("non-positive price {} for {}", row.price, row.symbol));
        }
        if row.signed_quantity.is_zero() {
            return Err(format!("zero quantity for {}", row.symbol));
        }
        Ok(Transaction {
            asset_class,
            symbol: row.symbol,
            date,
            signed_quantity: row.signed_quantity,
            price: row.price,
            currency: currency.to_string(),
            market: row.market.filter(|m| !m.is_empty()),
        })
    });
    // Replay expects ascending date order regardless of file order.
    result.records.sort_by(|a, b| a.date.cmp(&b.date));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
date,symbol,price,signed_quantity,market
2024-01-05,PETR4.SA,35.10,100,B3
2024-02-01,VALE3.SA,68.50,-50,B3
not-a-date,PETR4.SA,35.10,100,B3
2024-03-01,ITUB4.SA,0,100,B3
2024-01-02,PETR4.SA,34.80,200,
";

    #[test]
    fn test_import_keeps_good_rows_and_reports_bad_ones() {
        let result = import_transactions(SAMPLE.as_bytes(), AssetClass::Equity, "BRL");

        assert_eq!(result.records.len(), 3);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].row_index, 3);
        assert_eq!(result.errors[1].row_index, 4);
        assert!(result.errors[1].message.contains("non-positive price"));
    }

    #[test]
    fn test_import_sorts_by_date() {
        let result = import_transactions(SAMPLE.as_bytes(), AssetClass::Equity, "BRL");
        assert_eq!(result.records[0].date.to_string(), "2024-01-02");
        assert_eq!(result.records[0].signed_quantity, dec!(200));
        assert!(result.records[0].market.is_none());
        assert_eq!(result.records[2].signed_quantity, dec!(-50));
    }

    #[test]
    fn test_clean_file() {
        let csv = "date,symbol,price,signed_quantity\n2024-01-05,BTC-USD,42000.00,0.5\n";
        let result = import_transactions(csv.as_bytes(), AssetClass::Crypto, "USD");
        assert!(result.is_clean());
        assert_eq!(result.records[0].symbol, "BTC-USD");
    }
}
