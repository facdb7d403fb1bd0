//! Marketplace engine integration module
//!
//! Wires the order, settings, and analytics services together over either an
//! in-memory stack (`--demo`) or the PostgreSQL store from `DATABASE_URL`.

use std::sync::Arc;

use analytics_service::{AnalyticsService, InMemoryAnalyticsRepository};
use clap::Parser;
use common::model::listing::{ServiceCategory, ServiceListing};
use common::model::order::{NewOrder, Order, OrderStatus};
use common::model::user::{Actor, Role, User};
use dotenv::dotenv;
use order_service::{
    compute_split, InMemoryOrderRepository, OrderService, PostgresOrderRepository,
};
use rust_decimal_macros::dec;
use settings_service::{PostgresSettingsRepository, SettingsService};
use tokio::signal;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Run a demo order lifecycle against an in-memory store and exit
    #[clap(short, long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    // Create an environment filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("order_service=debug,settings_service=debug,analytics_service=debug")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        if env_debug == "1" {
            debug!("Debug logging enabled");
        }
    }

    info!("Starting Vendora Marketplace Engine...");

    if args.demo {
        run_demo().await?;
        return Ok(());
    }

    // Connect to the configured PostgreSQL store and keep the services alive
    let pool = common::db::init_db_pool().await?;
    common::db::run_migrations(&pool).await?;

    let settings = Arc::new(SettingsService::new(Arc::new(
        PostgresSettingsRepository::new(pool.clone()),
    )));
    let _orders = OrderService::new(
        Arc::new(PostgresOrderRepository::with_pool(pool.clone())),
        settings.clone(),
    );
    let _analytics = AnalyticsService::new(analytics_service::create_repository(pool));

    info!("Marketplace engine started. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

/// Drive a full order lifecycle against an in-memory stack
async fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    info!("Running demo lifecycle against an in-memory store");

    let store = Arc::new(InMemoryOrderRepository::new());
    let settings = Arc::new(SettingsService::in_memory());
    let orders = OrderService::new(store.clone(), settings.clone());
    let analytics = AnalyticsService::new(Arc::new(InMemoryAnalyticsRepository::new(
        store.clone(),
    )));

    // Seed the reference data the store joins against
    let admin = Actor::super_admin("demo-admin");
    orders
        .upsert_user(User::new("demo-admin", "Avery Admin", "admin@vendora.dev", Role::SuperAdmin))
        .await?;
    orders
        .upsert_user(User::new("agent-mira", "Mira Okafor", "mira@vendora.dev", Role::Agent))
        .await?;
    orders
        .upsert_user(User::new("agent-theo", "Theo Lindqvist", "theo@vendora.dev", Role::Agent))
        .await?;
    orders
        .upsert_user(User::new("buyer-zoe", "Zoe Marchetti", "zoe@example.com", Role::Customer))
        .await?;

    let logo_pack = orders
        .upsert_service(ServiceListing::new(
            "logo-pack",
            "Logo Pack",
            "Three logo concepts with two revision rounds",
            ServiceCategory::Branding,
            dec!(180.00),
            5,
        ))
        .await?;
    let stream_overlay = orders
        .upsert_service(ServiceListing::new(
            "stream-overlay",
            "Stream Overlay Set",
            "Animated overlay, alerts, and panels",
            ServiceCategory::GraphicDesign,
            dec!(95.00),
            7,
        ))
        .await?;

    info!("Seeded {} active services", orders.list_active_services().await?.len());

    // Two successful checkouts arrive through the webhook path
    let first = orders
        .create_from_checkout(NewOrder {
            order_number: Order::generate_number(),
            buyer_id: "buyer-zoe".to_string(),
            service_id: logo_pack.id,
            amount: logo_pack.price,
            requirements: Some("Minimal wordmark, dark palette".to_string()),
            payment_session_id: "cs_demo_001".to_string(),
            payment_intent_id: Some("pi_demo_001".to_string()),
        })
        .await?;
    let second = orders
        .create_from_checkout(NewOrder {
            order_number: Order::generate_number(),
            buyer_id: "buyer-zoe".to_string(),
            service_id: stream_overlay.id,
            amount: stream_overlay.price,
            requirements: None,
            payment_session_id: "cs_demo_002".to_string(),
            payment_intent_id: Some("pi_demo_002".to_string()),
        })
        .await?;

    // Preview the split the way an assignment dialog would, then commit
    let default_rate = settings.default_commission_rate().await?;
    let preview = compute_split(first.amount, default_rate)?;
    info!(
        "Assignment preview for {}: platform {} / agent {}",
        first.order_number, preview.platform_commission, preview.agent_earnings
    );

    orders.assign(&admin, first.id, "agent-mira", None).await?;

    // The second order is claimed by an agent directly
    let theo = Actor::agent("agent-theo");
    orders.accept_pending(&theo, second.id).await?;

    // Mira works the first order through to completion
    let mira = Actor::agent("agent-mira");
    orders
        .update_status(&mira, first.id, OrderStatus::InProgress, None)
        .await?;
    orders
        .update_status(&mira, first.id, OrderStatus::Delivered, Some("First draft attached".to_string()))
        .await?;
    orders
        .update_status(&mira, first.id, OrderStatus::Completed, None)
        .await?;

    // Show what the dashboards would render
    let dashboard = analytics.admin_dashboard(&admin).await?;
    info!(
        "Admin dashboard: revenue {} (platform {}, agents {}), {} orders, {} pending, {} active agents",
        dashboard.revenue,
        dashboard.platform_commission,
        dashboard.agent_earnings,
        dashboard.total_orders,
        dashboard.pending_orders,
        dashboard.active_agents
    );

    let mira_stats = analytics.agent_stats(&mira).await?;
    info!(
        "Agent {} stats: earnings {}, {} completed, {} in progress",
        mira.user_id, mira_stats.total_earnings, mira_stats.completed_orders, mira_stats.in_progress_orders
    );

    for entry in orders.history(first.id).await? {
        info!(
            "History {} -> {}: {}",
            entry.created_at.format("%H:%M:%S"),
            entry.status,
            entry.note.unwrap_or_default()
        );
    }

    info!("Demo lifecycle completed");
    Ok(())
}
