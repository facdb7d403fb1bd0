//! Repository for order data
//!
//! The store pairs every order mutation with its status-history insert in a
//! single transaction (one DashMap entry guard in memory, one database
//! transaction in Postgres), and every read predicate excludes soft-deleted
//! rows.

use async_trait::async_trait;
use chrono::Utc;
use common::error::{Error, Result};
use common::model::listing::ServiceListing;
use common::model::order::{Order, OrderStatus, StatusHistoryEntry};
use common::model::user::{Role, User};
use common::money::Rate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::commission::CommissionSplit;

/// Filter for order listings; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Only orders in this status
    pub status: Option<OrderStatus>,
    /// Only orders assigned to this seller
    pub seller_id: Option<String>,
    /// Only orders bought by this buyer
    pub buyer_id: Option<String>,
}

impl OrderFilter {
    /// Filter by status
    pub fn by_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Filter by seller
    pub fn by_seller(seller_id: impl Into<String>) -> Self {
        Self {
            seller_id: Some(seller_id.into()),
            ..Self::default()
        }
    }

    /// Filter by buyer
    pub fn by_buyer(buyer_id: impl Into<String>) -> Self {
        Self {
            buyer_id: Some(buyer_id.into()),
            ..Self::default()
        }
    }
}

/// Order repository trait defining the interface for order data storage
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order together with its initial history entry.
    ///
    /// Fails with `DuplicatePaymentSession` when the order's payment session
    /// id already produced an order.
    async fn create_order(&self, order: Order, history: StatusHistoryEntry) -> Result<Order>;

    /// Get an order by ID, excluding soft-deleted rows
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;

    /// Look up an order by its payment session id (webhook idempotency key)
    async fn find_by_payment_session(&self, session_id: &str) -> Result<Option<Order>>;

    /// List orders matching a filter, newest first
    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Assign a seller and lock in the commission split.
    ///
    /// Returns `None` when the order does not exist or is soft-deleted.
    async fn assign_order(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>>;

    /// Conditionally claim a pending, unassigned order for a seller.
    ///
    /// The claim only succeeds while `status = pending` and no seller is set;
    /// of two racing claims exactly one observes that state. Returns `None`
    /// when the condition did not hold (taken, gone, or soft-deleted).
    async fn claim_pending(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>>;

    /// Set a new status, bumping `updated_at` and stamping `completed_at`
    /// iff the new status is `completed`. Returns `None` when the order does
    /// not exist or is soft-deleted.
    async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>>;

    /// Soft-delete an order. Returns `None` when it does not exist or is
    /// already soft-deleted.
    async fn archive_order(
        &self,
        id: Uuid,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>>;

    /// Get the append-only status history of an order, oldest first
    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>>;

    /// Create or update a user (reference data owned by the auth collaborator)
    async fn upsert_user(&self, user: User) -> Result<User>;

    /// Get a user by ID
    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// Count non-banned users with the agent role
    async fn count_active_agents(&self) -> Result<i64>;

    /// Create or update a service listing
    async fn upsert_service(&self, listing: ServiceListing) -> Result<ServiceListing>;

    /// Get a service listing by ID, excluding soft-deleted rows
    async fn get_service(&self, id: Uuid) -> Result<Option<ServiceListing>>;

    /// List active, non-deleted service listings
    async fn list_active_services(&self) -> Result<Vec<ServiceListing>>;
}

/// In-memory repository for order data
pub struct InMemoryOrderRepository {
    /// Orders by ID
    pub orders: DashMap<Uuid, Order>,
    /// Payment session index enforcing checkout idempotency
    pub sessions: DashMap<String, Uuid>,
    /// Status history by order ID, append-only
    pub history: DashMap<Uuid, Vec<StatusHistoryEntry>>,
    /// Users by ID
    pub users: DashMap<String, User>,
    /// Service listings by ID
    pub services: DashMap<Uuid, ServiceListing>,
}

impl InMemoryOrderRepository {
    /// Create a new in-memory order repository
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            sessions: DashMap::new(),
            history: DashMap::new(),
            users: DashMap::new(),
            services: DashMap::new(),
        }
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create_order(&self, order: Order, history: StatusHistoryEntry) -> Result<Order> {
        if let Some(session_id) = order.payment_session_id.clone() {
            match self.sessions.entry(session_id.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::DuplicatePaymentSession(format!(
                        "Payment session {} already has an order",
                        session_id
                    )));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(order.id);
                }
            }
        }

        self.orders.insert(order.id, order.clone());
        self.history.entry(order.id).or_default().push(history);

        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self
            .orders
            .get(&id)
            .filter(|o| o.deleted_at.is_none())
            .map(|o| o.clone()))
    }

    async fn find_by_payment_session(&self, session_id: &str) -> Result<Option<Order>> {
        let order_id = match self.sessions.get(session_id) {
            Some(id) => *id,
            None => return Ok(None),
        };

        self.get_order(order_id).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| o.deleted_at.is_none())
            .filter(|o| filter.status.map_or(true, |s| o.status == s))
            .filter(|o| {
                filter
                    .seller_id
                    .as_deref()
                    .map_or(true, |s| o.seller_id.as_deref() == Some(s))
            })
            .filter(|o| {
                filter
                    .buyer_id
                    .as_deref()
                    .map_or(true, |b| o.buyer_id == b)
            })
            .map(|o| o.clone())
            .collect();

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }

    async fn assign_order(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        let updated = {
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry) if entry.deleted_at.is_none() => entry,
                _ => return Ok(None),
            };

            entry.seller_id = Some(seller_id.to_string());
            entry.status = OrderStatus::Assigned;
            entry.commission_rate = rate;
            entry.platform_commission = Some(split.platform_commission);
            entry.agent_earnings = Some(split.agent_earnings);
            entry.updated_at = Utc::now();
            entry.clone()
        };

        self.history.entry(id).or_default().push(history);

        Ok(Some(updated))
    }

    async fn claim_pending(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        let updated = {
            // The entry guard makes the check-and-set atomic: a racing claim
            // blocks here until the winner has written the seller
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry)
                    if entry.deleted_at.is_none()
                        && entry.seller_id.is_none()
                        && entry.status == OrderStatus::Pending =>
                {
                    entry
                }
                _ => return Ok(None),
            };

            entry.seller_id = Some(seller_id.to_string());
            entry.status = OrderStatus::Assigned;
            entry.commission_rate = rate;
            entry.platform_commission = Some(split.platform_commission);
            entry.agent_earnings = Some(split.agent_earnings);
            entry.updated_at = Utc::now();
            entry.clone()
        };

        self.history.entry(id).or_default().push(history);

        Ok(Some(updated))
    }

    async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        let updated = {
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry) if entry.deleted_at.is_none() => entry,
                _ => return Ok(None),
            };

            let now = Utc::now();
            entry.status = new_status;
            entry.updated_at = now;
            if new_status == OrderStatus::Completed {
                entry.completed_at = Some(now);
            }
            entry.clone()
        };

        self.history.entry(id).or_default().push(history);

        Ok(Some(updated))
    }

    async fn archive_order(
        &self,
        id: Uuid,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        let updated = {
            let mut entry = match self.orders.get_mut(&id) {
                Some(entry) if entry.deleted_at.is_none() => entry,
                _ => return Ok(None),
            };

            let now = Utc::now();
            entry.deleted_at = Some(now);
            entry.updated_at = now;
            entry.clone()
        };

        self.history.entry(id).or_default().push(history);

        Ok(Some(updated))
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        Ok(self
            .history
            .get(&order_id)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn upsert_user(&self, user: User) -> Result<User> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn count_active_agents(&self) -> Result<i64> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.role == Role::Agent && !u.banned)
            .count() as i64)
    }

    async fn upsert_service(&self, listing: ServiceListing) -> Result<ServiceListing> {
        self.services.insert(listing.id, listing.clone());
        Ok(listing)
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<ServiceListing>> {
        Ok(self
            .services
            .get(&id)
            .filter(|s| s.deleted_at.is_none())
            .map(|s| s.clone()))
    }

    async fn list_active_services(&self) -> Result<Vec<ServiceListing>> {
        let mut services: Vec<ServiceListing> = self
            .services
            .iter()
            .filter(|s| s.is_active && s.deleted_at.is_none())
            .map(|s| s.clone())
            .collect();

        services.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(services)
    }
}

/// PostgreSQL repository for order data
pub struct PostgresOrderRepository {
    /// Database connection pool
    pool: PgPool,
}

const ORDER_COLUMNS: &str = "id, order_number, buyer_id, seller_id, service_id, amount, \
     commission_rate, platform_commission, agent_earnings, status, requirements, \
     delivery_message, payment_session_id, payment_intent_id, created_at, updated_at, \
     completed_at, deleted_at";

const SERVICE_COLUMNS: &str = "id, slug, name, description, category, price, delivery_days, \
     is_active, created_at, updated_at, deleted_at";

impl PostgresOrderRepository {
    /// Create a new PostgreSQL order repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let pool = match database_url {
            Some(url) => {
                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await
                    .map_err(Error::Database)?
            }
            None => {
                let database_url = std::env::var("DATABASE_URL").map_err(|_| {
                    Error::ConfigurationError("DATABASE_URL must be set".to_string())
                })?;

                PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&database_url)
                    .await
                    .map_err(Error::Database)?
            }
        };

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL order repository over an existing pool
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new PostgreSQL order repository with configuration
    pub async fn with_config(config: &crate::config::OrderServiceConfig) -> Result<Self> {
        info!(
            "Connecting to PostgreSQL database with pool size: {}",
            config.db_pool_size
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    let status: String = row.get("status");

    Ok(Order {
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
    })
}

fn history_from_row(row: &PgRow) -> StatusHistoryEntry {
    StatusHistoryEntry {
        id: row.get("id"),
        order_id: row.get("order_id"),
        status: row.get("status"),
        changed_by: row.get("changed_by"),
        note: row.get("note"),
        created_at: row.get("created_at"),
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");

    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: role.parse()?,
        banned: row.get("banned"),
        created_at: row.get("created_at"),
    })
}

fn service_from_row(row: &PgRow) -> Result<ServiceListing> {
    let category: String = row.get("category");

    Ok(ServiceListing {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        category: category.parse()?,
        price: row.get("price"),
        delivery_days: row.get("delivery_days"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    })
}

fn map_order_insert_error(e: sqlx::Error, session_id: Option<&str>) -> Error {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() && db.constraint() == Some("orders_payment_session_id_key") {
            return Error::DuplicatePaymentSession(format!(
                "Payment session {} already has an order",
                session_id.unwrap_or("<none>")
            ));
        }
    }

    Error::Database(e)
}

async fn insert_history(
    tx: &mut Transaction<'_, Postgres>,
    entry: &StatusHistoryEntry,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, status, changed_by, note, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.id)
    .bind(entry.order_id)
    .bind(&entry.status)
    .bind(&entry.changed_by)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create_order(&self, order: Order, history: StatusHistoryEntry) -> Result<Order> {
        debug!("Creating order {} in database", order.order_number);

        let mut tx = self.pool.begin().await?;

        let insert = sqlx::query(
            "INSERT INTO orders (id, order_number, buyer_id, seller_id, service_id, amount,
                commission_rate, platform_commission, agent_earnings, status, requirements,
                delivery_message, payment_session_id, payment_intent_id, created_at,
                updated_at, completed_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.buyer_id)
        .bind(&order.seller_id)
        .bind(order.service_id)
        .bind(order.amount)
        .bind(order.commission_rate)
        .bind(order.platform_commission)
        .bind(order.agent_earnings)
        .bind(order.status.as_str())
        .bind(&order.requirements)
        .bind(&order.delivery_message)
        .bind(&order.payment_session_id)
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .bind(order.deleted_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            return Err(map_order_insert_error(
                e,
                order.payment_session_id.as_deref(),
            ));
        }

        insert_history(&mut tx, &history).await?;
        tx.commit().await?;

        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND deleted_at IS NULL",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| order_from_row(&r)).transpose()
    }

    async fn find_by_payment_session(&self, session_id: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM orders WHERE payment_session_id = $1 AND deleted_at IS NULL",
            ORDER_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| order_from_row(&r)).transpose()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {} FROM orders WHERE deleted_at IS NULL", ORDER_COLUMNS);
        let mut placeholder = 0;

        if filter.status.is_some() {
            placeholder += 1;
            sql.push_str(&format!(" AND status = ${}", placeholder));
        }
        if filter.seller_id.is_some() {
            placeholder += 1;
            sql.push_str(&format!(" AND seller_id = ${}", placeholder));
        }
        if filter.buyer_id.is_some() {
            placeholder += 1;
            sql.push_str(&format!(" AND buyer_id = ${}", placeholder));
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(seller_id) = filter.seller_id.clone() {
            query = query.bind(seller_id);
        }
        if let Some(buyer_id) = filter.buyer_id.clone() {
            query = query.bind(buyer_id);
        }

        let rows = query.fetch_all(&self.pool).await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn assign_order(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        debug!("Assigning order {} to seller {}", id, seller_id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE orders
             SET seller_id = $2, status = 'assigned', commission_rate = $3,
                 platform_commission = $4, agent_earnings = $5, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(seller_id)
        .bind(rate)
        .bind(split.platform_commission)
        .bind(split.agent_earnings)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        insert_history(&mut tx, &history).await?;
        tx.commit().await?;

        Ok(Some(order_from_row(&row)?))
    }

    async fn claim_pending(
        &self,
        id: Uuid,
        seller_id: &str,
        rate: Rate,
        split: &CommissionSplit,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        debug!("Seller {} claiming pending order {}", seller_id, id);

        let mut tx = self.pool.begin().await?;

        // The WHERE clause is the race guard: of two concurrent claims only
        // one update matches a row that is still pending and sellerless
        let row = sqlx::query(&format!(
            "UPDATE orders
             SET seller_id = $2, status = 'assigned', commission_rate = $3,
                 platform_commission = $4, agent_earnings = $5, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
               AND status = 'pending' AND seller_id IS NULL
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(seller_id)
        .bind(rate)
        .bind(split.platform_commission)
        .bind(split.agent_earnings)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        insert_history(&mut tx, &history).await?;
        tx.commit().await?;

        Ok(Some(order_from_row(&row)?))
    }

    async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        debug!("Updating order {} status to {}", id, new_status);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE orders
             SET status = $2, updated_at = now(),
                 completed_at = CASE WHEN $3 THEN now() ELSE completed_at END
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(new_status.as_str())
        .bind(new_status == OrderStatus::Completed)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        insert_history(&mut tx, &history).await?;
        tx.commit().await?;

        Ok(Some(order_from_row(&row)?))
    }

    async fn archive_order(
        &self,
        id: Uuid,
        history: StatusHistoryEntry,
    ) -> Result<Option<Order>> {
        debug!("Archiving order {}", id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "UPDATE orders
             SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        insert_history(&mut tx, &history).await?;
        tx.commit().await?;

        Ok(Some(order_from_row(&row)?))
    }

    async fn history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, order_id, status, changed_by, note, created_at
             FROM order_status_history
             WHERE order_id = $1
             ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(history_from_row).collect())
    }

    async fn upsert_user(&self, user: User) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, banned, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id)
             DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email,
                 role = EXCLUDED.role, banned = EXCLUDED.banned",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.banned)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, role, banned, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    async fn count_active_agents(&self) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total FROM users WHERE role = 'agent' AND banned = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    async fn upsert_service(&self, listing: ServiceListing) -> Result<ServiceListing> {
        sqlx::query(
            "INSERT INTO services (id, slug, name, description, category, price, delivery_days,
                is_active, created_at, updated_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (id)
             DO UPDATE SET slug = EXCLUDED.slug, name = EXCLUDED.name,
                 description = EXCLUDED.description, category = EXCLUDED.category,
                 price = EXCLUDED.price, delivery_days = EXCLUDED.delivery_days,
                 is_active = EXCLUDED.is_active, updated_at = now()",
        )
        .bind(listing.id)
        .bind(&listing.slug)
        .bind(&listing.name)
        .bind(&listing.description)
        .bind(listing.category.as_str())
        .bind(listing.price)
        .bind(listing.delivery_days)
        .bind(listing.is_active)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .bind(listing.deleted_at)
        .execute(&self.pool)
        .await?;

        Ok(listing)
    }

    async fn get_service(&self, id: Uuid) -> Result<Option<ServiceListing>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM services WHERE id = $1 AND deleted_at IS NULL",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| service_from_row(&r)).transpose()
    }

    async fn list_active_services(&self) -> Result<Vec<ServiceListing>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM services WHERE is_active = TRUE AND deleted_at IS NULL ORDER BY name",
            SERVICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(service_from_row).collect()
    }
}
