mod performance_model;
mod performance_service;

pub use performance_model::{
    BenchmarkComparison, DrawdownEpisode, MonthlyReturn, RiskMetrics, RollingPoint, SeriesPoint,
};
pub use performance_service::PerformanceAnalytics;
