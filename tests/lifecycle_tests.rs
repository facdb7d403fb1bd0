// File: tests/lifecycle_tests.rs


use common::error::Error;
use common::model::listing::{ServiceCategory, ServiceListing};
use common::model::order::{NewOrder, Order, OrderStatus};
use common::model::user::{Actor, Role, User};
use common::money::dec;
use futures::future::join_all;
use rust_decimal::Decimal;
use test_helpers::{in_memory_stack, MarketplaceStack};

fn admin() -> Actor {
    Actor::super_admin("admin-1")
}

async fn seed_reference_data(stack: &MarketplaceStack) -> ServiceListing {
    stack
        .orders
        .upsert_user(User::new("admin-1", "Avery Admin", "admin@vendora.dev", Role::SuperAdmin))
        .await
        .unwrap();
    stack
        .orders
        .upsert_user(User::new("agent-1", "Mira Okafor", "mira@vendora.dev", Role::Agent))
        .await
        .unwrap();
    stack
        .orders
        .upsert_user(User::new("agent-2", "Theo Lindqvist", "theo@vendora.dev", Role::Agent))
        .await
        .unwrap();
    stack
        .orders
        .upsert_user(User::new("buyer-1", "Zoe Marchetti", "zoe@example.com", Role::Customer))
        .await
        .unwrap();

    stack
        .orders
        .upsert_service(ServiceListing::new(
            "logo-pack",
            "Logo Pack",
            "Three logo concepts",
            ServiceCategory::Branding,
            dec!(100.00),
            5,
        ))
        .await
        .unwrap()
}

async fn checkout(
    stack: &MarketplaceStack,
    listing: &ServiceListing,
    session: &str,
    amount: Decimal,
) -> Order {
    stack
        .orders
        .create_from_checkout(NewOrder {
            order_number: Order::generate_number(),
            buyer_id: "buyer-1".to_string(),
            service_id: listing.id,
            amount,
            requirements: None,
            payment_session_id: session.to_string(),
            payment_intent_id: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn full_lifecycle_from_checkout_to_completion() {
    let stack = in_memory_stack();
    let listing = seed_reference_data(&stack).await;

    let order = checkout(&stack, &listing, "cs_journey", dec!(100.00)).await;

    // Agent claims the order, then works it through a revision cycle
    let worker = Actor::agent("agent-1");
    stack.orders.accept_pending(&worker, order.id).await.unwrap();
    stack
        .orders
        .update_status(&worker, order.id, OrderStatus::InProgress, None)
        .await
        .unwrap();
    stack
        .orders
        .update_status(&worker, order.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    stack
        .orders
        .update_status(&worker, order.id, OrderStatus::RevisionRequested, None)
        .await
        .unwrap();
    stack
        .orders
        .update_status(&worker, order.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    let completed = stack
        .orders
        .update_status(&worker, order.id, OrderStatus::Completed, None)
        .await
        .unwrap();

    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.completed_at.is_some());

    // The locked-in split still sums back to the amount
    assert_eq!(
        completed.platform_commission.unwrap() + completed.agent_earnings.unwrap(),
        completed.amount
    );

    // One audit row per mutation, in order
    let history = stack.orders.history(order.id).await.unwrap();
    let statuses: Vec<&str> = history.iter().map(|h| h.status.as_str()).collect();
    assert_eq!(
        statuses,
        vec![
            "pending",
            "assigned",
            "in_progress",
            "delivered",
            "revision_requested",
            "delivered",
            "completed"
        ]
    );

    // Both dashboards see the finished order
    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();
    assert_eq!(dashboard.revenue, dec!(100.00));
    assert_eq!(dashboard.total_orders, 1);
    assert_eq!(dashboard.pending_orders, 0);

    let stats = stack.analytics.agent_stats(&worker).await.unwrap();
    assert_eq!(stats.total_earnings, dec!(80.00));
    assert_eq!(stats.completed_orders, 1);
    assert_eq!(stats.in_progress_orders, 0);
}

#[tokio::test]
async fn many_agents_racing_for_one_order_produce_one_seller() {
    let stack = in_memory_stack();
    let listing = seed_reference_data(&stack).await;
    let order = checkout(&stack, &listing, "cs_race", dec!(100.00)).await;

    let order_id = order.id;
    let agents = ["agent-1", "agent-2", "agent-3", "agent-4"];
    let attempts = join_all(agents.iter().map(|agent| {
        let orders = stack.orders.clone();
        let actor = Actor::agent(*agent);
        async move { orders.accept_pending(&actor, order_id).await }
    }))
    .await;

    let winners = attempts.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(attempts
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(Error::OrderAlreadyAssigned(_)))));

    let stored = stack.orders.get_order(order.id).await.unwrap().unwrap();
    assert!(stored.seller_id.is_some());

    let history = stack.orders.history(order.id).await.unwrap();
    assert_eq!(history.iter().filter(|h| h.status == "assigned").count(), 1);
}

#[tokio::test]
async fn revenue_aggregate_matches_the_revenue_bearing_subset() {
    let stack = in_memory_stack();
    let listing = seed_reference_data(&stack).await;

    // pending 50.00, assigned 100.00, completed 200.00, cancelled 75.00
    let _pending = checkout(&stack, &listing, "cs_p", dec!(50.00)).await;

    let assigned = checkout(&stack, &listing, "cs_a", dec!(100.00)).await;
    stack
        .orders
        .assign(&admin(), assigned.id, "agent-1", None)
        .await
        .unwrap();

    let completed = checkout(&stack, &listing, "cs_c", dec!(200.00)).await;
    stack
        .orders
        .assign(&admin(), completed.id, "agent-2", None)
        .await
        .unwrap();
    let worker = Actor::agent("agent-2");
    stack
        .orders
        .update_status(&worker, completed.id, OrderStatus::InProgress, None)
        .await
        .unwrap();
    stack
        .orders
        .update_status(&worker, completed.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    stack
        .orders
        .update_status(&worker, completed.id, OrderStatus::Completed, None)
        .await
        .unwrap();

    let cancelled = checkout(&stack, &listing, "cs_x", dec!(75.00)).await;
    stack
        .orders
        .update_status(&admin(), cancelled.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();

    let dashboard = stack.analytics.admin_dashboard(&admin()).await.unwrap();
    assert_eq!(dashboard.revenue, dec!(300.00));
    assert_eq!(dashboard.total_orders, 4);
    assert_eq!(dashboard.pending_orders, 1);
}

#[tokio::test]
async fn updated_default_rate_applies_to_the_next_assignment() {
    let stack = in_memory_stack();
    let listing = seed_reference_data(&stack).await;

    let first = checkout(&stack, &listing, "cs_r1", dec!(100.00)).await;
    let before = stack
        .orders
        .assign(&admin(), first.id, "agent-1", None)
        .await
        .unwrap();
    assert_eq!(before.platform_commission, Some(dec!(20.00)));

    stack
        .settings
        .update_default_commission_rate(&admin(), dec!(30))
        .await
        .unwrap();

    let second = checkout(&stack, &listing, "cs_r2", dec!(100.00)).await;
    let after = stack
        .orders
        .assign(&admin(), second.id, "agent-1", None)
        .await
        .unwrap();
    assert_eq!(after.commission_rate, dec!(30.00));
    assert_eq!(after.platform_commission, Some(dec!(30.00)));
    assert_eq!(after.agent_earnings, Some(dec!(70.00)));
}
