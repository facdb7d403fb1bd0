//! Order lifecycle engine
//!
//! State machine over order status. The engine validates capability, order
//! ownership, and the lifecycle transition table, resolves commission rates
//! through the settings service, and records one status-history entry per
//! mutation through the repository.

use std::sync::Arc;

use common::error::{Error, Result};
use common::model::listing::ServiceListing;
use common::model::order::{NewOrder, Order, OrderStatus, StatusHistoryEntry};
use common::model::user::{Action, Actor, Role, User};
use common::money::{precision, Rate};
use rust_decimal::Decimal;
use settings_service::SettingsService;
use tracing::{debug, info};
use uuid::Uuid;

use crate::commission::compute_split;
use crate::repository::{
    InMemoryOrderRepository, OrderFilter, OrderRepository, PostgresOrderRepository,
};

/// Order service driving the fulfillment lifecycle
pub struct OrderService {
    /// Repository for order data
    repo: Arc<dyn OrderRepository>,
    /// Settings provider supplying the default commission rate
    settings: Arc<SettingsService>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl OrderService {
    /// Create a new order service over an existing repository
    pub fn new(repo: Arc<dyn OrderRepository>, settings: Arc<SettingsService>) -> Self {
        Self { repo, settings }
    }

    /// Create a new order service with a specific repository type
    pub async fn with_repository(
        repo_type: RepositoryType,
        settings: Arc<SettingsService>,
    ) -> Result<Self> {
        let repo: Arc<dyn OrderRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryOrderRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresOrderRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo, settings })
    }

    /// Create a new order service with a configuration
    pub async fn with_config(
        config: &crate::config::OrderServiceConfig,
        settings: Arc<SettingsService>,
    ) -> Result<Self> {
        let repo: Arc<dyn OrderRepository> =
            Arc::new(PostgresOrderRepository::with_config(config).await?);

        Ok(Self { repo, settings })
    }

    /// Create a pending order from a completed checkout.
    ///
    /// This is the path the payment-webhook collaborator calls after a
    /// successful payment. It is idempotent per payment session: a session
    /// that already produced an order returns that order, including when a
    /// concurrent creation wins the insert race.
    pub async fn create_from_checkout(&self, new_order: NewOrder) -> Result<Order> {
        if new_order.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "Order amount must be positive, got {}",
                new_order.amount
            )));
        }

        if let Some(existing) = self
            .repo
            .find_by_payment_session(&new_order.payment_session_id)
            .await?
        {
            info!(
                "Payment session {} already has order {}, returning it",
                new_order.payment_session_id, existing.order_number
            );
            return Ok(existing);
        }

        let session_id = new_order.payment_session_id.clone();
        let order = Order::from_checkout(new_order);
        let history = StatusHistoryEntry::new(
            order.id,
            OrderStatus::Pending.as_str(),
            order.buyer_id.clone(),
            Some("Order created from successful payment".to_string()),
        );

        match self.repo.create_order(order, history).await {
            Ok(order) => {
                info!(
                    "Created order {} for payment session {}",
                    order.order_number, session_id
                );
                Ok(order)
            }
            Err(Error::DuplicatePaymentSession(_)) => {
                // Lost the creation race; the first writer's order is authoritative
                self.repo
                    .find_by_payment_session(&session_id)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "Order for payment session {} missing after duplicate detection",
                            session_id
                        ))
                    })
            }
            Err(e) => Err(e),
        }
    }

    /// Assign an order to an agent, locking in the commission split.
    ///
    /// The effective rate is the custom override when supplied, otherwise the
    /// platform default. Restricted to super admins, who may also reassign
    /// orders that already have a seller.
    pub async fn assign(
        &self,
        actor: &Actor,
        order_id: Uuid,
        agent_id: &str,
        custom_rate: Option<Rate>,
    ) -> Result<Order> {
        actor.require(Action::AssignOrder)?;

        let rate = match custom_rate {
            Some(rate) => precision::round_rate(rate),
            None => self.settings.default_commission_rate().await?,
        };

        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        let split = compute_split(order.amount, rate)?;

        let note = format!(
            "Assigned to agent {} (Commission: {}%, Platform: ${}, Agent: ${})",
            agent_id, rate, split.platform_commission, split.agent_earnings
        );
        let history = StatusHistoryEntry::new(
            order_id,
            OrderStatus::Assigned.as_str(),
            actor.user_id.clone(),
            Some(note),
        );

        let updated = self
            .repo
            .assign_order(order_id, agent_id, rate, &split, history)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        info!(
            "Order {} assigned to agent {} at {}%",
            updated.order_number, agent_id, rate
        );

        Ok(updated)
    }

    /// Agent self-assignment of a pending, unassigned order at the default
    /// commission rate. The calling agent becomes the seller.
    pub async fn accept_pending(&self, actor: &Actor, order_id: Uuid) -> Result<Order> {
        actor.require(Action::AcceptOrder)?;

        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        if order.seller_id.is_some() || order.status != OrderStatus::Pending {
            return Err(Error::OrderAlreadyAssigned(format!(
                "Order {} already has a seller",
                order.order_number
            )));
        }

        let rate = self.settings.default_commission_rate().await?;
        let split = compute_split(order.amount, rate)?;

        let note = format!(
            "Order accepted by agent (Commission: {}%, Agent Earnings: ${})",
            rate, split.agent_earnings
        );
        let history = StatusHistoryEntry::new(
            order_id,
            OrderStatus::Assigned.as_str(),
            actor.user_id.clone(),
            Some(note),
        );

        match self
            .repo
            .claim_pending(order_id, &actor.user_id, rate, &split, history)
            .await?
        {
            Some(updated) => {
                info!(
                    "Order {} accepted by agent {}",
                    updated.order_number, actor.user_id
                );
                Ok(updated)
            }
            None => {
                // The conditional claim found nothing to update: either the
                // order vanished or another agent got there first
                match self.repo.get_order(order_id).await? {
                    Some(_) => Err(Error::OrderAlreadyAssigned(format!(
                        "Order {} was accepted by another agent",
                        order_id
                    ))),
                    None => Err(Error::OrderNotFound(format!("Order not found: {}", order_id))),
                }
            }
        }
    }

    /// Move an order to a new lifecycle status.
    ///
    /// Agents may only move orders assigned to them; super admins bypass the
    /// ownership check. The transition table is enforced for everyone, and
    /// `pending`/`assigned` are never valid targets here -- assignment goes
    /// through [`assign`](Self::assign) or
    /// [`accept_pending`](Self::accept_pending).
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: Uuid,
        new_status: OrderStatus,
        note: Option<String>,
    ) -> Result<Order> {
        actor.require(Action::UpdateOrderStatus)?;

        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        if actor.role == Role::Agent
            && order.seller_id.as_deref() != Some(actor.user_id.as_str())
        {
            return Err(Error::NotOrderOwner(format!(
                "Order {} is not assigned to {}",
                order.order_number, actor.user_id
            )));
        }

        if matches!(new_status, OrderStatus::Pending | OrderStatus::Assigned) {
            return Err(Error::IllegalTransition(format!(
                "Orders cannot be moved to {} directly; assignment goes through assignment operations",
                new_status
            )));
        }

        if !order.status.can_transition_to(new_status) {
            return Err(Error::IllegalTransition(format!(
                "Cannot move order {} from {} to {}",
                order.order_number, order.status, new_status
            )));
        }

        let history = StatusHistoryEntry::new(
            order_id,
            new_status.as_str(),
            actor.user_id.clone(),
            Some(note.unwrap_or_else(|| format!("Status updated to {}", new_status))),
        );

        let updated = self
            .repo
            .update_status(order_id, new_status, history)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        info!(
            "Order {} moved from {} to {}",
            updated.order_number, order.status, new_status
        );

        Ok(updated)
    }

    /// Soft-delete an order, hiding it from every read and mutation path
    pub async fn archive(&self, actor: &Actor, order_id: Uuid) -> Result<Order> {
        actor.require(Action::ArchiveOrder)?;

        let order = self
            .repo
            .get_order(order_id)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        let history = StatusHistoryEntry::new(
            order_id,
            order.status.as_str(),
            actor.user_id.clone(),
            Some("Order archived".to_string()),
        );

        let updated = self
            .repo
            .archive_order(order_id, history)
            .await?
            .ok_or_else(|| Error::OrderNotFound(format!("Order not found: {}", order_id)))?;

        info!("Order {} archived by {}", updated.order_number, actor.user_id);

        Ok(updated)
    }

    /// Get an order by ID
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>> {
        self.repo.get_order(order_id).await
    }

    /// Look up an order by its payment session id
    pub async fn find_by_payment_session(&self, session_id: &str) -> Result<Option<Order>> {
        self.repo.find_by_payment_session(session_id).await
    }

    /// List all orders matching a filter, newest first. Admin only.
    pub async fn list_orders(&self, actor: &Actor, filter: OrderFilter) -> Result<Vec<Order>> {
        actor.require(Action::ViewAllOrders)?;
        self.repo.list_orders(&filter).await
    }

    /// Get the status history of an order, oldest first
    pub async fn history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        self.repo.history(order_id).await
    }

    /// Register or update a user (called by the auth collaborator)
    pub async fn upsert_user(&self, user: User) -> Result<User> {
        debug!("Upserting user {}", user.id);
        self.repo.upsert_user(user).await
    }

    /// Register or update a service listing
    pub async fn upsert_service(&self, listing: ServiceListing) -> Result<ServiceListing> {
        debug!("Upserting service listing {}", listing.slug);
        self.repo.upsert_service(listing).await
    }

    /// Get a service listing by ID
    pub async fn get_service(&self, id: Uuid) -> Result<Option<ServiceListing>> {
        self.repo.get_service(id).await
    }

    /// List active service listings
    pub async fn list_active_services(&self) -> Result<Vec<ServiceListing>> {
        self.repo.list_active_services().await
    }
}
