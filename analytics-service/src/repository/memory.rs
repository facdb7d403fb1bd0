//! In-memory analytics derived from the shared in-memory order store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::Result;
use common::model::order::{Order, OrderStatus};
use common::model::user::Role;
use common::money::Amount;
use order_service::InMemoryOrderRepository;

use super::AnalyticsRepository;
use crate::models::{AgentStats, MonthlyRevenue, OrderSummary, RevenueTotals};

/// In-memory analytics repository reading the same maps the order store writes
pub struct InMemoryAnalyticsRepository {
    /// Shared in-memory order store
    store: Arc<InMemoryOrderRepository>,
}

impl InMemoryAnalyticsRepository {
    /// Create a new in-memory analytics repository over an order store
    pub fn new(store: Arc<InMemoryOrderRepository>) -> Self {
        Self { store }
    }

    fn live_orders(&self) -> Vec<Order> {
        self.store
            .orders
            .iter()
            .filter(|o| o.deleted_at.is_none())
            .map(|o| o.clone())
            .collect()
    }

    fn summarize(&self, order: Order) -> OrderSummary {
        let buyer = self.store.users.get(&order.buyer_id);
        let seller = order
            .seller_id
            .as_ref()
            .and_then(|id| self.store.users.get(id));
        let service = self.store.services.get(&order.service_id);

        OrderSummary {
            buyer_name: buyer.as_ref().map(|u| u.name.clone()),
            buyer_email: buyer.as_ref().map(|u| u.email.clone()),
            seller_name: seller.as_ref().map(|u| u.name.clone()),
            service_name: service.as_ref().map(|s| s.name.clone()),
            service_category: service.as_ref().map(|s| s.category),
            order,
        }
    }

    fn summaries_newest_first(&self, mut orders: Vec<Order>) -> Vec<OrderSummary> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.into_iter().map(|o| self.summarize(o)).collect()
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn revenue_totals(&self) -> Result<RevenueTotals> {
        let mut totals = RevenueTotals::default();

        for order in self.live_orders() {
            if !order.status.is_revenue_bearing() {
                continue;
            }
            totals.revenue += order.amount;
            totals.platform_commission += order.platform_commission.unwrap_or_default();
            totals.agent_earnings += order.agent_earnings.unwrap_or_default();
        }

        Ok(totals)
    }

    async fn count_orders(&self) -> Result<i64> {
        Ok(self.live_orders().len() as i64)
    }

    async fn count_pending_orders(&self) -> Result<i64> {
        Ok(self
            .live_orders()
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count() as i64)
    }

    async fn count_active_agents(&self) -> Result<i64> {
        Ok(self
            .store
            .users
            .iter()
            .filter(|u| u.role == Role::Agent && !u.banned)
            .count() as i64)
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>> {
        let mut summaries = self.summaries_newest_first(self.live_orders());
        summaries.truncate(limit as usize);
        Ok(summaries)
    }

    async fn revenue_by_month(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyRevenue>> {
        let mut buckets: BTreeMap<String, (Amount, i64)> = BTreeMap::new();

        for order in self.live_orders() {
            if !order.status.is_revenue_bearing() || order.created_at < since {
                continue;
            }
            let month = order.created_at.format("%Y-%m").to_string();
            let bucket = buckets.entry(month).or_default();
            bucket.0 += order.amount;
            bucket.1 += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(month, (total, orders))| MonthlyRevenue {
                month,
                total,
                orders,
            })
            .collect())
    }

    async fn agent_stats(&self, seller_id: &str) -> Result<AgentStats> {
        let mut stats = AgentStats::default();

        for order in self.live_orders() {
            if order.seller_id.as_deref() != Some(seller_id) {
                continue;
            }
            if order.status == OrderStatus::Completed {
                stats.total_earnings += order.agent_earnings.unwrap_or_default();
                stats.completed_orders += 1;
            }
            if order.status.is_active_assignment() {
                stats.in_progress_orders += 1;
            }
        }

        Ok(stats)
    }

    async fn pending_unassigned_orders(&self) -> Result<Vec<OrderSummary>> {
        let pending: Vec<Order> = self
            .live_orders()
            .into_iter()
            .filter(|o| o.status == OrderStatus::Pending && o.seller_id.is_none())
            .collect();

        Ok(self.summaries_newest_first(pending))
    }

    async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderSummary>> {
        let owned: Vec<Order> = self
            .live_orders()
            .into_iter()
            .filter(|o| o.seller_id.as_deref() == Some(seller_id))
            .collect();

        Ok(self.summaries_newest_first(owned))
    }
}
