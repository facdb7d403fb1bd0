//! Read-only reporting views over the marketplace order store

pub mod models;
pub mod repository;
pub mod service;

pub use models::{AdminAnalytics, AgentStats, MonthlyRevenue, OrderSummary, RevenueTotals};
pub use repository::{
    create_repository, AnalyticsRepository, InMemoryAnalyticsRepository,
    PostgresAnalyticsRepository,
};
pub use service::AnalyticsService;
