mod memory;
mod postgres;

pub use memory::InMemoryAnalyticsRepository;
pub use postgres::PostgresAnalyticsRepository;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::Result;
use sqlx::PgPool;

use crate::models::{AgentStats, MonthlyRevenue, OrderSummary, RevenueTotals};

/// Read-only aggregation queries over the order store.
///
/// All reads exclude soft-deleted orders.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Revenue, commission, and earnings totals over the revenue-bearing set
    async fn revenue_totals(&self) -> Result<RevenueTotals>;

    /// Count of all orders
    async fn count_orders(&self) -> Result<i64>;

    /// Count of orders awaiting assignment
    async fn count_pending_orders(&self) -> Result<i64>;

    /// Count of non-banned agents
    async fn count_active_agents(&self) -> Result<i64>;

    /// Most recent orders with display fields, newest first
    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>>;

    /// Monthly revenue buckets for revenue-bearing orders created since the
    /// given instant, keyed by calendar month and sorted ascending
    async fn revenue_by_month(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyRevenue>>;

    /// Lifetime stats for a single agent
    async fn agent_stats(&self, seller_id: &str) -> Result<AgentStats>;

    /// Pending orders with no seller yet (the agents' claim queue)
    async fn pending_unassigned_orders(&self) -> Result<Vec<OrderSummary>>;

    /// All orders assigned to a seller, newest first
    async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderSummary>>;
}

/// Create a Postgres-backed analytics repository over an existing pool
pub fn create_repository(pool: PgPool) -> Arc<dyn AnalyticsRepository> {
    Arc::new(PostgresAnalyticsRepository::new(pool))
}
