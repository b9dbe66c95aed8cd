pub mod csv_parser;

mod bonds_model;
mod bonds_service;
mod indexer_table;

pub use bonds_model::{BondPortfolioSummary, BondPosition, BondValuation, Indexer, MaturityEntry};
pub use bonds_service::BondIndexationEngine;
pub use csv_parser::import_bonds;
pub use indexer_table::{accrual_months, monthly_equivalent, IndexerTable};
