// Database persistence tests - run against a real PostgreSQL instance
//
// Enable with `--features db_tests` and set TEST_DATABASE_URL.

#![cfg(feature = "db_tests")]


use std::sync::Arc;

use common::error::Error;
use common::model::listing::{ServiceCategory, ServiceListing};
use common::model::order::{NewOrder, Order, OrderStatus};
use common::model::user::{Actor, Role, User};
use common::money::dec;
use order_service::{OrderService, PostgresOrderRepository};
use settings_service::{PostgresSettingsRepository, SettingsService};
use test_helpers::db::DbTestContext;

async fn postgres_stack(ctx: &DbTestContext) -> (Arc<OrderService>, Arc<SettingsService>) {
    let settings = Arc::new(SettingsService::new(Arc::new(
        PostgresSettingsRepository::new(ctx.pool.clone()),
    )));
    let orders = Arc::new(OrderService::new(
        Arc::new(PostgresOrderRepository::with_pool(ctx.pool.clone())),
        settings.clone(),
    ));

    (orders, settings)
}

async fn seed_reference_data(orders: &OrderService) -> ServiceListing {
    orders
        .upsert_user(User::new("db-admin", "Avery Admin", "admin@vendora.dev", Role::SuperAdmin))
        .await
        .expect("Failed to seed admin user");
    orders
        .upsert_user(User::new("db-agent-1", "Mira Okafor", "mira@vendora.dev", Role::Agent))
        .await
        .expect("Failed to seed agent");
    orders
        .upsert_user(User::new("db-agent-2", "Theo Lindqvist", "theo@vendora.dev", Role::Agent))
        .await
        .expect("Failed to seed agent");
    orders
        .upsert_user(User::new("db-buyer", "Zoe Marchetti", "zoe@example.com", Role::Customer))
        .await
        .expect("Failed to seed buyer");

    orders
        .upsert_service(ServiceListing::new(
            "db-logo-pack",
            "Logo Pack",
            "Three logo concepts",
            ServiceCategory::Branding,
            dec!(100.00),
            5,
        ))
        .await
        .expect("Failed to seed service listing")
}

fn new_order(listing: &ServiceListing, session: &str) -> NewOrder {
    NewOrder {
        order_number: Order::generate_number(),
        buyer_id: "db-buyer".to_string(),
        service_id: listing.id,
        amount: dec!(100.00),
        requirements: None,
        payment_session_id: session.to_string(),
        payment_intent_id: None,
    }
}

#[tokio::test]
#[ignore = "Requires test database, run with cargo test --features db_tests -- --ignored"]
async fn postgres_order_lifecycle_persists_audit_trail() {
    let ctx = DbTestContext::new().await;
    ctx.cleanup().await;

    let (orders, _settings) = postgres_stack(&ctx).await;
    let listing = seed_reference_data(&orders).await;
    let admin = Actor::super_admin("db-admin");

    let order = orders
        .create_from_checkout(new_order(&listing, "cs_db_lifecycle"))
        .await
        .expect("Failed to create order");
    assert_eq!(order.status, OrderStatus::Pending);

    // Duplicate session resolves to the same order
    let duplicate = orders
        .create_from_checkout(new_order(&listing, "cs_db_lifecycle"))
        .await
        .expect("Duplicate creation should be idempotent");
    assert_eq!(duplicate.id, order.id);

    let assigned = orders
        .assign(&admin, order.id, "db-agent-1", None)
        .await
        .expect("Failed to assign order");
    assert_eq!(assigned.platform_commission, Some(dec!(20.00)));
    assert_eq!(assigned.agent_earnings, Some(dec!(80.00)));

    let worker = Actor::agent("db-agent-1");
    orders
        .update_status(&worker, order.id, OrderStatus::InProgress, None)
        .await
        .expect("Failed to start work");
    orders
        .update_status(&worker, order.id, OrderStatus::Delivered, None)
        .await
        .expect("Failed to deliver");
    let completed = orders
        .update_status(&worker, order.id, OrderStatus::Completed, None)
        .await
        .expect("Failed to complete");
    assert!(completed.completed_at.is_some());

    let history = orders.history(order.id).await.expect("Failed to read history");
    let statuses: Vec<&str> = history.iter().map(|h| h.status.as_str()).collect();
    assert_eq!(
        statuses,
        vec!["pending", "assigned", "in_progress", "delivered", "completed"]
    );

    ctx.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires test database, run with cargo test --features db_tests -- --ignored"]
async fn postgres_concurrent_accepts_have_exactly_one_winner() {
    let ctx = DbTestContext::new().await;
    ctx.cleanup().await;

    let (orders, _settings) = postgres_stack(&ctx).await;
    let listing = seed_reference_data(&orders).await;

    let order = orders
        .create_from_checkout(new_order(&listing, "cs_db_race"))
        .await
        .expect("Failed to create order");

    let first = {
        let orders = orders.clone();
        let actor = Actor::agent("db-agent-1");
        tokio::spawn(async move { orders.accept_pending(&actor, order.id).await })
    };
    let second = {
        let orders = orders.clone();
        let actor = Actor::agent("db-agent-2");
        tokio::spawn(async move { orders.accept_pending(&actor, order.id).await })
    };

    let results = [
        first.await.expect("accept task panicked"),
        second.await.expect("accept task panicked"),
    ];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(Error::OrderAlreadyAssigned(_)))));

    let history = orders.history(order.id).await.expect("Failed to read history");
    assert_eq!(history.iter().filter(|h| h.status == "assigned").count(), 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[ignore = "Requires test database, run with cargo test --features db_tests -- --ignored"]
async fn postgres_settings_lazily_initialize_once() {
    let ctx = DbTestContext::new().await;
    ctx.cleanup().await;

    let (_orders, settings) = postgres_stack(&ctx).await;

    let (a, b) = tokio::join!(
        settings.default_commission_rate(),
        settings.default_commission_rate()
    );
    assert_eq!(a.expect("first read failed"), dec!(20.00));
    assert_eq!(b.expect("second read failed"), dec!(20.00));

    let row = sqlx::query("SELECT COUNT(*) AS total FROM platform_settings")
        .fetch_one(&ctx.pool)
        .await
        .expect("Failed to count settings");
    let total: i64 = sqlx::Row::get(&row, "total");
    assert_eq!(total, 1);

    ctx.cleanup().await;
}
