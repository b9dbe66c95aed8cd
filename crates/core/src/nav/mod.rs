mod nav_model;
mod nav_service;

pub use nav_model::{InvestorAllocation, NavSnapshot};
pub use nav_service::NavCalculator;
