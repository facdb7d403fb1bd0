//! Reporting view models

use common::model::listing::ServiceCategory;
use common::model::order::Order;
use common::money::Amount;
use serde::{Deserialize, Serialize};

/// Revenue totals over the revenue-bearing status set
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RevenueTotals {
    /// Gross order amounts
    pub revenue: Amount,
    /// Platform's cut
    pub platform_commission: Amount,
    /// Agents' cut
    pub agent_earnings: Amount,
}

/// An order joined with buyer/seller/service display fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    /// The order itself
    pub order: Order,
    /// Buyer display name
    pub buyer_name: Option<String>,
    /// Buyer email
    pub buyer_email: Option<String>,
    /// Seller display name, none while unassigned
    pub seller_name: Option<String>,
    /// Purchased service name
    pub service_name: Option<String>,
    /// Purchased service category
    pub service_category: Option<ServiceCategory>,
}

/// One calendar month of revenue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRevenue {
    /// Calendar month keyed "YYYY-MM"
    pub month: String,
    /// Gross revenue for the month
    pub total: Amount,
    /// Number of revenue-bearing orders created in the month
    pub orders: i64,
}

/// Admin dashboard aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAnalytics {
    /// Gross revenue over the revenue-bearing status set
    pub revenue: Amount,
    /// Platform commission total
    pub platform_commission: Amount,
    /// Agent earnings total
    pub agent_earnings: Amount,
    /// All orders in the system
    pub total_orders: i64,
    /// Orders awaiting assignment
    pub pending_orders: i64,
    /// Registered, non-banned agents
    pub active_agents: i64,
    /// Most recent orders with display fields
    pub recent_orders: Vec<OrderSummary>,
    /// Monthly revenue over the trailing window
    pub revenue_by_month: Vec<MonthlyRevenue>,
}

/// Per-agent dashboard stats
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AgentStats {
    /// Lifetime earnings over completed orders
    pub total_earnings: Amount,
    /// Completed order count
    pub completed_orders: i64,
    /// Open workload count (assigned through revision_requested)
    pub in_progress_orders: i64,
}
