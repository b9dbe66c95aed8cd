//! Bond CSV ingestion.
//!
//! Expected columns: `title, issuer, quantity, unit_price, invested_value,
//! indexer, percent_indexed, application_date, maturity_date`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

use super::bonds_model::{BondPosition, Indexer};
use crate::imports::{read_rows, ImportResult};

#[derive(Debug, Deserialize)]
struct BondRow {
    title: String,
    issuer: String,
    quantity: Decimal,
    unit_price: Decimal,
    invested_value: Decimal,
    indexer: String,
    percent_indexed: Decimal,
    application_date: String,
    maturity_date: String,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid {} '{}': {}", field, value, e))
}

/// Loads bond positions from CSV, assigning each a fresh issue id.
pub fn import_bonds<R: Read>(reader: R, currency: &str) -> ImportResult<BondPosition> {
    read_rows(reader, |row: BondRow| {
        if row.title.is_empty() {
            return Err("missing title".to_string());
        }
        let indexer = Indexer::parse(&row.indexer)
            .ok_or_else(|| format!("unknown indexer '{}'", row.indexer))?;
        if row.invested_value <= Decimal::ZERO {
            return Err(format!(
                "non-positive invested_value {} for {}",
                row.invested_value, row.title
            ));
        }
        let issue_date = parse_date("application_date", &row.application_date)?;
        let maturity_date = parse_date("maturity_date", &row.maturity_date)?;
        if maturity_date <= issue_date {
            return Err(format!(
                "maturity {} not after application {} for {}",
                maturity_date, issue_date, row.title
            ));
        }
        Ok(BondPosition {
            issue_id: Uuid::new_v4().to_string(),
            title: row.title,
            issuer: row.issuer,
            indexer,
            percent_indexed: row.percent_indexed,
            quantity: row.quantity,
            unit_price: row.unit_price,
            principal: row.invested_value,
            issue_date,
            maturity_date,
            currency: currency.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = "\
title,issuer,quantity,unit_price,invested_value,indexer,percent_indexed,application_date,maturity_date
Tesouro IPCA+ 2029,Tesouro Nacional,10,3000.00,30000.00,IPCA,6.5,2023-06-01,2029-05-15
CDB Banco X,Banco X,1,25000.00,25000.00,CDI,110,2023-08-15,2025-08-15
Bad Bond,Banco Y,1,1000.00,1000.00,WHAT,100,2023-01-01,2026-01-01
Inverted,Banco Z,1,1000.00,1000.00,CDI,100,2026-01-01,2023-01-01
";

    #[test]
    fn test_import_bonds_rejects_bad_rows_individually() {
        let result = import_bonds(SAMPLE.as_bytes(), "BRL");
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].message.contains("unknown indexer"));
        assert!(result.errors[1].message.contains("not after"));
    }

    #[test]
    fn test_imported_fields() {
        let result = import_bonds(SAMPLE.as_bytes(), "BRL");
        let ipca = &result.records[0];
        assert_eq!(ipca.indexer, Indexer::Ipca);
        assert_eq!(ipca.percent_indexed, dec!(6.5));
        assert_eq!(ipca.principal, dec!(30000.00));
        assert!(!ipca.issue_id.is_empty());
        assert_ne!(ipca.issue_id, result.records[1].issue_id);
    }
}
