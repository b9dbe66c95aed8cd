//! Fundfolio Core - Domain entities, services, and traits.
//!
//! Fund accounting and performance analytics for a multi-asset portfolio:
//! price caching, transaction-replay ledgers, bond indexation, investor
//! cash flows, the fee waterfall, NAV, and risk statistics. This crate is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` crate.

pub mod aggregator;
pub mod bonds;
pub mod cash;
pub mod constants;
pub mod errors;
pub mod fees;
pub mod fx;
pub mod imports;
pub mod ledger;
pub mod nav;
pub mod performance;
pub mod quotes;

// Re-export the facade and the types its surface exposes
pub use aggregator::*;
pub use nav::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
