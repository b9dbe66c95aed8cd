mod fees_errors;
mod fees_model;
mod fees_service;

pub use fees_errors::FeeError;
pub use fees_model::{FeeRecord, FeeStatus, FeeSummary, FeeType};
pub use fees_service::FeeEngine;

#[cfg(test)]
mod fees_service_tests;
