//! FarmPool realtime monitor
//!
//! Connects to the database, applies migrations and logs every committed
//! group buy and participant change until interrupted.

use anyhow::Context;
use tracing::{info, warn};

use FarmPool::{
    config::Settings,
    database::connection::{create_pool, run_migrations, DatabaseConfig},
    services::{ChangeEvent, ChangeKind, ChangeTable, ServiceFactory},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", FarmPool::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
    run_migrations(&db_pool).await?;

    let (services, listener) = ServiceFactory::postgres(settings, db_pool).await?;

    let stats = services.group_buy_service.marketplace_stats().await?;
    info!(
        active_groups = stats.active_groups,
        participants = stats.total_participants,
        products = stats.total_products,
        "Marketplace loaded"
    );

    let _groups = services.group_buy_service.subscribe_to_all_group_changes(log_change);
    let _participants = services.group_buy_service.subscribe_to_all_participant_changes(log_change);

    info!("FarmPool monitor is ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;

    listener.abort();
    info!("FarmPool monitor has been shut down.");

    Ok(())
}

fn log_change(event: ChangeEvent) {
    let id = event.record.get("id").and_then(|v| v.as_str()).unwrap_or("?");

    match (event.table, event.kind) {
        (ChangeTable::GroupBuys, ChangeKind::Update) => info!(
            group_id = id,
            status = ?event.record.get("status"),
            current_quantity = ?event.record.get("current_quantity"),
            unit_price = ?event.record.get("unit_price"),
            "Group buy updated"
        ),
        (ChangeTable::GroupParticipants, ChangeKind::Insert) => info!(
            participant_id = id,
            group_id = ?event.record.get("group_id"),
            quantity = ?event.record.get("quantity"),
            "Participant joined"
        ),
        (table, ChangeKind::Delete) => warn!(table = %table, id = id, "Row deleted"),
        (table, kind) => info!(table = %table, kind = ?kind, id = id, "Row changed"),
    }
}
