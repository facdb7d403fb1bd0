//! Analytics service implementation

use std::sync::Arc;

use chrono::{Months, Utc};
use common::error::Result;
use common::model::user::{Action, Actor};
use tracing::debug;

use crate::models::{AdminAnalytics, AgentStats, OrderSummary};
use crate::repository::AnalyticsRepository;

/// How many orders the admin dashboard's recent list shows
const RECENT_ORDER_LIMIT: i64 = 10;

/// Trailing window of the monthly revenue buckets
const REVENUE_WINDOW_MONTHS: u32 = 6;

/// Analytics service exposing the dashboard reporting views
pub struct AnalyticsService {
    /// Repository for aggregate queries
    repo: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    /// Create a new analytics service
    pub fn new(repo: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }

    /// Assemble the admin dashboard aggregate. Super admin only.
    pub async fn admin_dashboard(&self, actor: &Actor) -> Result<AdminAnalytics> {
        actor.require(Action::ViewAdminDashboard)?;

        debug!("Building admin dashboard for {}", actor.user_id);

        let totals = self.repo.revenue_totals().await?;
        let total_orders = self.repo.count_orders().await?;
        let pending_orders = self.repo.count_pending_orders().await?;
        let active_agents = self.repo.count_active_agents().await?;
        let recent_orders = self.repo.recent_orders(RECENT_ORDER_LIMIT).await?;

        let since = Utc::now()
            .checked_sub_months(Months::new(REVENUE_WINDOW_MONTHS))
            .unwrap_or_else(Utc::now);
        let revenue_by_month = self.repo.revenue_by_month(since).await?;

        Ok(AdminAnalytics {
            revenue: totals.revenue,
            platform_commission: totals.platform_commission,
            agent_earnings: totals.agent_earnings,
            total_orders,
            pending_orders,
            active_agents,
            recent_orders,
            revenue_by_month,
        })
    }

    /// Lifetime stats for the calling agent
    pub async fn agent_stats(&self, actor: &Actor) -> Result<AgentStats> {
        actor.require(Action::ViewAgentDashboard)?;
        self.repo.agent_stats(&actor.user_id).await
    }

    /// Pending, unassigned orders the calling agent could accept
    pub async fn agent_pending_orders(&self, actor: &Actor) -> Result<Vec<OrderSummary>> {
        actor.require(Action::ViewAgentDashboard)?;
        self.repo.pending_unassigned_orders().await
    }

    /// The calling agent's own orders, newest first
    pub async fn agent_order_history(&self, actor: &Actor) -> Result<Vec<OrderSummary>> {
        actor.require(Action::ViewAgentDashboard)?;
        self.repo.orders_for_seller(&actor.user_id).await
    }
}
