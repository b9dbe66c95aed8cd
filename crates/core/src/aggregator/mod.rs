mod aggregator_model;
mod aggregator_service;

pub use aggregator_model::{
    AllocationSlice, ConsolidatedSummary, PerformancePayload, QuotedRate,
};
pub use aggregator_service::PortfolioAggregator;

#[cfg(test)]
mod aggregator_service_tests;
