pub mod csv_parser;
mod ledger_model;
mod ledger_service;

pub use csv_parser::import_transactions;
pub use ledger_model::{AssetClass, Position, PositionValuation, ShortSalePolicy, Transaction};
pub use ledger_service::{PositionLedger, ReplayReport};

#[cfg(test)]
mod ledger_service_tests;
