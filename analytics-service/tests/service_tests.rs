use std::sync::Arc;

use analytics_service::{AnalyticsService, InMemoryAnalyticsRepository};
use chrono::Utc;
use common::error::Error;
use common::model::listing::{ServiceCategory, ServiceListing};
use common::model::order::{NewOrder, Order, OrderStatus};
use common::model::user::{Actor, Role, User};
use common::money::dec;
use order_service::{InMemoryOrderRepository, OrderService};
use rust_decimal::Decimal;
use settings_service::SettingsService;

fn admin() -> Actor {
    Actor::super_admin("admin-1")
}

struct TestStack {
    orders: OrderService,
    analytics: AnalyticsService,
}

/// Build a stack seeded with users, one listing, and four orders covering
/// the status set {pending, assigned, completed, cancelled}:
///
/// - 50.00  pending, unassigned
/// - 100.00 assigned to agent-1 (platform 20.00 / agent 80.00)
/// - 200.00 completed by agent-1 (platform 40.00 / agent 160.00)
/// - 75.00  cancelled before assignment
async fn seeded_stack() -> TestStack {
    let store = Arc::new(InMemoryOrderRepository::new());
    let settings = Arc::new(SettingsService::in_memory());
    let orders = OrderService::new(store.clone(), settings);
    let analytics = AnalyticsService::new(Arc::new(InMemoryAnalyticsRepository::new(store)));

    orders
        .upsert_user(User::new("admin-1", "Avery Admin", "admin@vendora.dev", Role::SuperAdmin))
        .await
        .unwrap();
    orders
        .upsert_user(User::new("agent-1", "Mira Okafor", "mira@vendora.dev", Role::Agent))
        .await
        .unwrap();
    orders
        .upsert_user(User::new("agent-2", "Theo Lindqvist", "theo@vendora.dev", Role::Agent))
        .await
        .unwrap();
    let mut banned = User::new("agent-3", "Banned Agent", "banned@vendora.dev", Role::Agent);
    banned.banned = true;
    orders.upsert_user(banned).await.unwrap();
    orders
        .upsert_user(User::new("buyer-1", "Zoe Marchetti", "zoe@example.com", Role::Customer))
        .await
        .unwrap();

    let listing = orders
        .upsert_service(ServiceListing::new(
            "logo-pack",
            "Logo Pack",
            "Three logo concepts",
            ServiceCategory::Branding,
            dec!(100.00),
            5,
        ))
        .await
        .unwrap();

    let seed = |session: &str, amount: Decimal| NewOrder {
        order_number: Order::generate_number(),
        buyer_id: "buyer-1".to_string(),
        service_id: listing.id,
        amount,
        requirements: None,
        payment_session_id: session.to_string(),
        payment_intent_id: None,
    };

    let _pending = orders.create_from_checkout(seed("cs_pending", dec!(50.00))).await.unwrap();

    let assigned = orders.create_from_checkout(seed("cs_assigned", dec!(100.00))).await.unwrap();
    orders.assign(&admin(), assigned.id, "agent-1", None).await.unwrap();

    let completed = orders.create_from_checkout(seed("cs_completed", dec!(200.00))).await.unwrap();
    orders.assign(&admin(), completed.id, "agent-1", None).await.unwrap();
    let worker = Actor::agent("agent-1");
    orders
        .update_status(&worker, completed.id, OrderStatus::InProgress, None)
        .await
        .unwrap();
    orders
        .update_status(&worker, completed.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    orders
        .update_status(&worker, completed.id, OrderStatus::Completed, None)
        .await
        .unwrap();

    let cancelled = orders.create_from_checkout(seed("cs_cancelled", dec!(75.00))).await.unwrap();
    orders
        .update_status(&admin(), cancelled.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    TestStack { orders, analytics }
}

#[tokio::test]
async fn revenue_aggregate_covers_exactly_the_revenue_bearing_subset() {
    let stack = seeded_stack().await;

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();

    // assigned (100.00) + completed (200.00); pending and cancelled excluded
    assert_eq!(dashboard.revenue, dec!(300.00));
    assert_eq!(dashboard.platform_commission, dec!(60.00));
    assert_eq!(dashboard.agent_earnings, dec!(240.00));
}

#[tokio::test]
async fn dashboard_counts_orders_and_active_agents() {
    let stack = seeded_stack().await;

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();

    assert_eq!(dashboard.total_orders, 4);
    assert_eq!(dashboard.pending_orders, 1);
    // agent-3 is banned and does not count
    assert_eq!(dashboard.active_agents, 2);
}

#[tokio::test]
async fn recent_orders_are_newest_first_with_display_fields() {
    let stack = seeded_stack().await;

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();

    assert_eq!(dashboard.recent_orders.len(), 4);
    for pair in dashboard.recent_orders.windows(2) {
        assert!(pair[0].order.created_at >= pair[1].order.created_at);
    }

    let first = &dashboard.recent_orders[0];
    assert_eq!(first.buyer_name.as_deref(), Some("Zoe Marchetti"));
    assert_eq!(first.service_name.as_deref(), Some("Logo Pack"));
    assert_eq!(first.service_category, Some(ServiceCategory::Branding));
}

#[tokio::test]
async fn monthly_revenue_buckets_by_calendar_month() {
    let stack = seeded_stack().await;

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();

    assert_eq!(dashboard.revenue_by_month.len(), 1);
    let bucket = &dashboard.revenue_by_month[0];
    assert_eq!(bucket.month, Utc::now().format("%Y-%m").to_string());
    assert_eq!(bucket.total, dec!(300.00));
    assert_eq!(bucket.orders, 2);
}

#[tokio::test]
async fn agent_stats_count_only_completed_earnings() {
    let stack = seeded_stack().await;

    let stats = stack
        .analytics
        .agent_stats(&Actor::agent("agent-1"))
        .await
        .unwrap();

    // The assigned order's 80.00 is open workload, not earned yet
    assert_eq!(stats.total_earnings, dec!(160.00));
    assert_eq!(stats.completed_orders, 1);
    assert_eq!(stats.in_progress_orders, 1);
}

#[tokio::test]
async fn agent_claim_queue_lists_only_unassigned_pending_orders() {
    let stack = seeded_stack().await;

    let queue = stack
        .analytics
        .agent_pending_orders(&Actor::agent("agent-2"))
        .await
        .unwrap();

    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].order.amount, dec!(50.00));
    assert!(queue[0].order.seller_id.is_none());
    assert_eq!(queue[0].service_name.as_deref(), Some("Logo Pack"));
}

#[tokio::test]
async fn agent_history_lists_the_agents_own_orders() {
    let stack = seeded_stack().await;

    let history = stack
        .analytics
        .agent_order_history(&Actor::agent("agent-1"))
        .await
        .unwrap();

    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|s| s.order.seller_id.as_deref() == Some("agent-1")));

    let empty = stack
        .analytics
        .agent_order_history(&Actor::agent("agent-2"))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn archived_orders_vanish_from_every_view() {
    let stack = seeded_stack().await;

    let assigned = stack
        .orders
        .find_by_payment_session("cs_assigned")
        .await
        .unwrap()
        .unwrap();
    stack.orders.archive(&admin(), assigned.id).await.unwrap();

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();
    assert_eq!(dashboard.revenue, dec!(200.00));
    assert_eq!(dashboard.total_orders, 3);

    let stats = stack
        .analytics
        .agent_stats(&Actor::agent("agent-1"))
        .await
        .unwrap();
    assert_eq!(stats.in_progress_orders, 0);

    let history = stack
        .analytics
        .agent_order_history(&Actor::agent("agent-1"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn dashboards_are_role_gated() {
    let stack = seeded_stack().await;

    let denied = stack
        .analytics
        .admin_dashboard(&Actor::agent("agent-1"))
        .await;
    assert!(matches!(denied, Err(Error::AuthorizationError(_))));

    let denied = stack.analytics.agent_stats(&admin()).await;
    assert!(matches!(denied, Err(Error::AuthorizationError(_))));

    let denied = stack
        .analytics
        .agent_pending_orders(&admin())
        .await;
    assert!(matches!(denied, Err(Error::AuthorizationError(_))));
}
