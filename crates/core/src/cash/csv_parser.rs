//! Cash-flow CSV ingestion.
//!
//! Expected columns: `date, investor_id, investor_name, type, amount,
//! currency, amount_in_base_currency, description`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

use super::cash_model::{CashFlow, CashFlowType};
use crate::imports::{read_rows, ImportResult};

#[derive(Debug, Deserialize)]
struct CashFlowRow {
    date: String,
    investor_id: String,
    #[serde(default)]
    investor_name: String,
    #[serde(rename = "type")]
    flow_type: String,
    amount: Decimal,
    currency: String,
    #[serde(default)]
    amount_in_base_currency: Option<Decimal>,
    #[serde(default)]
    description: Option<String>,
}

/// A parsed flow together with the investor name carried on the row.
pub struct ImportedCashFlow {
    pub flow: CashFlow,
    pub investor_name: String,
}

/// Loads cash flows from CSV. When `amount_in_base_currency` is blank the
/// row is assumed to already be in base currency.
pub fn import_cash_flows<R: Read>(reader: R) -> ImportResult<ImportedCashFlow> {
    read_rows(reader, |row: CashFlowRow| {
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
            .map_err(|e| format!("invalid date '{}': {}", row.date, e))?;
        if row.investor_id.is_empty() {
            return Err("missing investor_id".to_string());
        }
        let flow_type = CashFlowType::parse(&row.flow_type)
            .ok_or_else(|| format!("unknown flow type '{}'", row.flow_type))?;
        if row.amount <= Decimal::ZERO {
            return Err(format!("non-positive amount {} for {}", row.amount, row.investor_id));
        }
        Ok(ImportedCashFlow {
            flow: CashFlow {
                date,
                investor_id: row.investor_id,
                flow_type,
                amount: row.amount,
                currency: row.currency,
                amount_in_base_currency: row.amount_in_base_currency.unwrap_or(row.amount),
                description: row.description.filter(|d| !d.is_empty()),
            },
            investor_name: row.investor_name,
        })
    })
}
