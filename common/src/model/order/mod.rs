//! Order models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::money::{Amount, Rate};

/// Order fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid for, waiting for an agent
    Pending,
    /// An agent has been assigned and the commission split is locked in
    Assigned,
    /// The agent is working on the order
    InProgress,
    /// The agent has delivered the work
    Delivered,
    /// The buyer asked for changes to a delivery
    RevisionRequested,
    /// The buyer accepted the delivery
    Completed,
    /// Administratively cancelled
    Cancelled,
    /// Under dispute
    Disputed,
}

impl OrderStatus {
    /// Statuses that count toward platform revenue (anything past assignment)
    pub const REVENUE_BEARING: [OrderStatus; 4] = [
        OrderStatus::Assigned,
        OrderStatus::InProgress,
        OrderStatus::Delivered,
        OrderStatus::Completed,
    ];

    /// Statuses that count as an agent's open workload
    pub const ACTIVE_ASSIGNMENT: [OrderStatus; 4] = [
        OrderStatus::Assigned,
        OrderStatus::InProgress,
        OrderStatus::Delivered,
        OrderStatus::RevisionRequested,
    ];

    /// Wire/database encoding of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Assigned => "assigned",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Delivered => "delivered",
            OrderStatus::RevisionRequested => "revision_requested",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Disputed => "disputed",
        }
    }

    /// Check if the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Disputed
        )
    }

    /// Check if the status counts toward platform revenue
    pub fn is_revenue_bearing(&self) -> bool {
        Self::REVENUE_BEARING.contains(self)
    }

    /// Check if the status counts as open agent workload
    pub fn is_active_assignment(&self) -> bool {
        Self::ACTIVE_ASSIGNMENT.contains(self)
    }

    /// Lifecycle transition table.
    ///
    /// `cancelled` and `disputed` are administrative overrides reachable from
    /// any non-terminal state, including `pending` (before a seller exists).
    /// `revision_requested -> delivered` is the redelivery cycle.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return false;
        }
        match (*self, next) {
            (from, Cancelled | Disputed) if !from.is_terminal() => true,
            (Pending, Assigned) => true,
            (Assigned, InProgress) => true,
            (InProgress, Delivered) => true,
            (Delivered, Completed | RevisionRequested) => true,
            (RevisionRequested, Delivered) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "assigned" => Ok(OrderStatus::Assigned),
            "in_progress" => Ok(OrderStatus::InProgress),
            "delivered" => Ok(OrderStatus::Delivered),
            "revision_requested" => Ok(OrderStatus::RevisionRequested),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "disputed" => Ok(OrderStatus::Disputed),
            other => Err(Error::ValidationError(format!(
                "Unknown order status: {}",
                other
            ))),
        }
    }
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Human-readable order number, e.g. "ORD-20260806-3F9A1C"
    pub order_number: String,
    /// Buyer user ID, set at creation
    pub buyer_id: String,
    /// Agent assigned to this order, none until assignment
    pub seller_id: Option<String>,
    /// Purchased service listing
    pub service_id: Uuid,
    /// Order amount in currency units
    pub amount: Amount,
    /// Commission percentage applied at assignment time
    pub commission_rate: Rate,
    /// Platform's cut of the amount, none until assignment
    pub platform_commission: Option<Amount>,
    /// Agent's cut of the amount, none until assignment
    pub agent_earnings: Option<Amount>,
    /// Current fulfillment status
    pub status: OrderStatus,
    /// Buyer-supplied requirements
    pub requirements: Option<String>,
    /// Seller-supplied delivery message
    pub delivery_message: Option<String>,
    /// Payment checkout session ID, unique when set, written once at creation
    pub payment_session_id: Option<String>,
    /// Payment intent ID, written once at creation
    pub payment_intent_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, bumped on every mutation
    pub updated_at: DateTime<Utc>,
    /// Set only on transition into `completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete timestamp; excluded from all queries when set
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for the order-creation path invoked by the payment webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: String,
    pub buyer_id: String,
    pub service_id: Uuid,
    pub amount: Amount,
    pub requirements: Option<String>,
    pub payment_session_id: String,
    pub payment_intent_id: Option<String>,
}

impl Order {
    /// Create a new pending order from a completed checkout.
    ///
    /// The commission rate starts at the built-in default; the effective rate
    /// is resolved and locked in at assignment time.
    pub fn from_checkout(new_order: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number: new_order.order_number,
            buyer_id: new_order.buyer_id,
            seller_id: None,
            service_id: new_order.service_id,
            amount: new_order.amount,
            commission_rate: crate::model::settings::default_commission_rate(),
            platform_commission: None,
            agent_earnings: None,
            status: OrderStatus::Pending,
            requirements: new_order.requirements,
            delivery_message: None,
            payment_session_id: Some(new_order.payment_session_id),
            payment_intent_id: new_order.payment_intent_id,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deleted_at: None,
        }
    }

    /// Generate a human-readable order number
    pub fn generate_number() -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
        format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), suffix)
    }

    /// Check if the order has been soft-deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the order is still waiting for an agent
    pub fn is_unassigned(&self) -> bool {
        self.seller_id.is_none() && self.status == OrderStatus::Pending
    }
}

/// Append-only audit record of an order status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// Owning order
    pub order_id: Uuid,
    /// Status snapshot at the time of the change (free text, not an enum)
    pub status: String,
    /// User who performed the change
    pub changed_by: String,
    /// Optional human-readable note
    pub note: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    /// Create a new history entry for an order mutation
    pub fn new(
        order_id: Uuid,
        status: impl Into<String>,
        changed_by: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            status: status.into(),
            changed_by: changed_by.into(),
            note,
            created_at: Utc::now(),
        }
    }
}
