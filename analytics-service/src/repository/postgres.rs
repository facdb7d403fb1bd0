//! PostgreSQL analytics queries

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::Result;
use common::model::order::{Order, OrderStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::AnalyticsRepository;
use crate::models::{AgentStats, MonthlyRevenue, OrderSummary, RevenueTotals};

/// PostgreSQL analytics repository
pub struct PostgresAnalyticsRepository {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresAnalyticsRepository {
    /// Create a new PostgreSQL analytics repository over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SUMMARY_SELECT: &str = "SELECT o.id, o.order_number, o.buyer_id, o.seller_id, o.service_id, \
     o.amount, o.commission_rate, o.platform_commission, o.agent_earnings, o.status, \
     o.requirements, o.delivery_message, o.payment_session_id, o.payment_intent_id, \
     o.created_at, o.updated_at, o.completed_at, o.deleted_at, \
     b.name AS buyer_name, b.email AS buyer_email, s.name AS seller_name, \
     sv.name AS service_name, sv.category AS service_category \
     FROM orders o \
     LEFT JOIN users b ON b.id = o.buyer_id \
     LEFT JOIN users s ON s.id = o.seller_id \
     LEFT JOIN services sv ON sv.id = o.service_id";

fn revenue_statuses() -> Vec<String> {
    OrderStatus::REVENUE_BEARING
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

fn active_statuses() -> Vec<String> {
    OrderStatus::ACTIVE_ASSIGNMENT
        .iter()
        .map(|s| s.as_str().to_string())
        .collect()
}

fn summary_from_row(row: &PgRow) -> Result<OrderSummary> {
    let status: String = row.get("status");
    let category: Option<String> = row.get("service_category");

    let order = Order {
        id: row.get("id"),
        order_number: row.get("order_number"),
        buyer_id: row.get("buyer_id"),
        seller_id: row.get("seller_id"),
        service_id: row.get("service_id"),
        amount: row.get("amount"),
        commission_rate: row.get("commission_rate"),
        platform_commission: row.get("platform_commission"),
        agent_earnings: row.get("agent_earnings"),
        status: status.parse()?,
        requirements: row.get("requirements"),
        delivery_message: row.get("delivery_message"),
        payment_session_id: row.get("payment_session_id"),
        payment_intent_id: row.get("payment_intent_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
        deleted_at: row.get("deleted_at"),
    };

    Ok(OrderSummary {
        order,
        buyer_name: row.get("buyer_name"),
        buyer_email: row.get("buyer_email"),
        seller_name: row.get("seller_name"),
        service_name: row.get("service_name"),
        service_category: category.map(|c| c.parse()).transpose()?,
    })
}

#[async_trait]
impl AnalyticsRepository for PostgresAnalyticsRepository {
    async fn revenue_totals(&self) -> Result<RevenueTotals> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS revenue,
                    COALESCE(SUM(platform_commission), 0) AS platform_commission,
                    COALESCE(SUM(agent_earnings), 0) AS agent_earnings
             FROM orders
             WHERE deleted_at IS NULL AND status = ANY($1)",
        )
        .bind(revenue_statuses())
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueTotals {
            revenue: row.get("revenue"),
            platform_commission: row.get("platform_commission"),
            agent_earnings: row.get("agent_earnings"),
        })
    }

    async fn count_orders(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM orders WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("total"))
    }

    async fn count_pending_orders(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM orders
             WHERE deleted_at IS NULL AND status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    async fn count_active_agents(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM users WHERE role = 'agent' AND banned = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE o.deleted_at IS NULL ORDER BY o.created_at DESC LIMIT $1",
            SUMMARY_SELECT
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn revenue_by_month(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyRevenue>> {
        let rows = sqlx::query(
            "SELECT TO_CHAR(created_at, 'YYYY-MM') AS month,
                    COALESCE(SUM(amount), 0) AS total,
                    COUNT(*) AS orders
             FROM orders
             WHERE deleted_at IS NULL AND created_at >= $1 AND status = ANY($2)
             GROUP BY TO_CHAR(created_at, 'YYYY-MM')
             ORDER BY TO_CHAR(created_at, 'YYYY-MM')",
        )
        .bind(since)
        .bind(revenue_statuses())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MonthlyRevenue {
                month: row.get("month"),
                total: row.get("total"),
                orders: row.get("orders"),
            })
            .collect())
    }

    async fn agent_stats(&self, seller_id: &str) -> Result<AgentStats> {
        let earnings = sqlx::query(
            "SELECT COALESCE(SUM(agent_earnings), 0) AS total FROM orders
             WHERE deleted_at IS NULL AND seller_id = $1 AND status = 'completed'",
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let completed = sqlx::query(
            "SELECT COUNT(*) AS total FROM orders
             WHERE deleted_at IS NULL AND seller_id = $1 AND status = 'completed'",
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        let in_progress = sqlx::query(
            "SELECT COUNT(*) AS total FROM orders
             WHERE deleted_at IS NULL AND seller_id = $1 AND status = ANY($2)",
        )
        .bind(seller_id)
        .bind(active_statuses())
        .fetch_one(&self.pool)
        .await?;

        Ok(AgentStats {
            total_earnings: earnings.get("total"),
            completed_orders: completed.get("total"),
            in_progress_orders: in_progress.get("total"),
        })
    }

    async fn pending_unassigned_orders(&self) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE o.deleted_at IS NULL AND o.status = 'pending' AND o.seller_id IS NULL
             ORDER BY o.created_at DESC",
            SUMMARY_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn orders_for_seller(&self, seller_id: &str) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE o.deleted_at IS NULL AND o.seller_id = $1 ORDER BY o.created_at DESC",
            SUMMARY_SELECT
        ))
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }
}
