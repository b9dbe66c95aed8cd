pub mod csv_parser;

mod cash_model;
mod cash_service;

pub use cash_model::{
    CashFlow, CashFlowType, InvestorAccount, InvestorContribution, InvestorStatus,
};
pub use cash_service::CashLedger;
pub use csv_parser::{import_cash_flows, ImportedCashFlow};

#[cfg(test)]
mod cash_service_tests;
