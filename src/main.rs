//! civic-gateway server entry point.
//!
//! Starts the Axum HTTP server plus the background tasks: notification
//! dispatcher, event-log writer and periodic snapshotter.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use civic_gateway::api;
use civic_gateway::app_state::AppState;
use civic_gateway::config::GatewayConfig;
use civic_gateway::domain::ticket::Ticket;
use civic_gateway::domain::user::UserProfile;
use civic_gateway::domain::{
    EventBus, TicketEvent, TicketFilter, TicketRegistry, UpvoteLedger, UserDirectory,
};
use civic_gateway::notify::{NotificationDispatcher, NotificationFeed};
use civic_gateway::persistence::PostgresPersistence;
use civic_gateway::service::TicketService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting civic-gateway");

    // Build domain layer
    let registry = Arc::new(TicketRegistry::new());
    let ledger = Arc::new(UpvoteLedger::new());
    let directory = Arc::new(load_directory(config.user_fixtures_path.as_deref())?);
    let feed = Arc::new(NotificationFeed::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Optional persistence: restore state, then keep writing behind
    let persistence = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        let persistence = PostgresPersistence::new(pool);
        persistence.ensure_schema().await?;
        restore_state(&persistence, &registry, &ledger).await?;
        Some(persistence)
    } else {
        None
    };

    // Build service layer
    let ticket_service = Arc::new(TicketService::new(
        Arc::clone(&registry),
        Arc::clone(&ledger),
        Arc::clone(&directory),
        event_bus.clone(),
    ));

    // Background: notification fan-out
    let dispatcher = NotificationDispatcher::new(Arc::clone(&feed), Arc::clone(&directory));
    tokio::spawn(dispatcher.run(event_bus.clone()));

    // Background: event log writer and periodic snapshots
    if let Some(persistence) = persistence {
        if config.event_log_enabled {
            tokio::spawn(event_log_writer(
                persistence.clone(),
                event_bus.subscribe(),
            ));
        }
        tokio::spawn(snapshot_loop(
            persistence,
            Arc::clone(&registry),
            config.snapshot_interval_secs,
            config.cleanup_after_days,
        ));
    }

    // Build application state
    let app_state = AppState {
        ticket_service,
        notification_feed: feed,
        directory,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Seeds the user directory from a JSON fixture file, or starts empty.
fn load_directory(path: Option<&str>) -> anyhow::Result<UserDirectory> {
    let Some(path) = path else {
        tracing::warn!("USER_FIXTURES_PATH not set; starting with an empty user directory");
        return Ok(UserDirectory::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading user fixtures from {path}"))?;
    let profiles: Vec<UserProfile> =
        serde_json::from_str(&raw).with_context(|| format!("parsing user fixtures in {path}"))?;
    tracing::info!(count = profiles.len(), path, "loaded user fixtures");
    Ok(UserDirectory::from_fixtures(profiles))
}

/// Restores tickets from the latest snapshots and replays upvote events
/// so the once-per-user guarantee survives restarts.
async fn restore_state(
    persistence: &PostgresPersistence,
    registry: &TicketRegistry,
    ledger: &UpvoteLedger,
) -> anyhow::Result<()> {
    let snapshots = persistence.load_latest_snapshots().await?;
    let mut restored = 0usize;
    for snapshot in snapshots {
        match serde_json::from_value::<Ticket>(snapshot.ticket_json) {
            Ok(ticket) => {
                if let Err(e) = registry.insert(ticket).await {
                    tracing::warn!(ticket_id = %snapshot.ticket_id, error = %e, "skipping snapshot");
                } else {
                    restored += 1;
                }
            }
            Err(e) => {
                tracing::warn!(ticket_id = %snapshot.ticket_id, error = %e, "undecodable snapshot");
            }
        }
    }

    let mut votes = 0usize;
    let events = persistence
        .load_events_after(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH, None)
        .await?;
    for stored in events {
        if stored.event_type != "upvoted" {
            continue;
        }
        if let Ok(TicketEvent::Upvoted {
            ticket_id,
            voter_id,
            ..
        }) = serde_json::from_value::<TicketEvent>(stored.payload)
            && ledger.record(ticket_id, voter_id).await.is_ok()
        {
            votes += 1;
        }
    }

    tracing::info!(tickets = restored, upvotes = votes, "state restored from snapshots");
    Ok(())
}

/// Appends every bus event to the PostgreSQL event log.
async fn event_log_writer(
    persistence: PostgresPersistence,
    mut rx: broadcast::Receiver<TicketEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let payload = match serde_json::to_value(&event) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize event");
                        continue;
                    }
                };
                if let Err(e) = persistence
                    .save_event(*event.ticket_id().as_uuid(), event.event_type_str(), &payload)
                    .await
                {
                    tracing::error!(error = %e, "failed to persist event");
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "event log writer lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Periodically snapshots every ticket and prunes old snapshots.
async fn snapshot_loop(
    persistence: PostgresPersistence,
    registry: Arc<TicketRegistry>,
    interval_secs: u64,
    cleanup_after_days: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.tick().await;
    loop {
        interval.tick().await;

        for ticket in registry.list(&TicketFilter::default()).await {
            let ticket_json = match serde_json::to_value(&ticket) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(ticket_id = %ticket.id, error = %e, "failed to serialize ticket");
                    continue;
                }
            };
            if let Err(e) = persistence
                .save_snapshot(*ticket.id.as_uuid(), ticket.status.as_str(), &ticket_json)
                .await
            {
                tracing::error!(ticket_id = %ticket.id, error = %e, "failed to snapshot ticket");
            }
        }

        if cleanup_after_days > 0 {
            match persistence.delete_old_snapshots(cleanup_after_days).await {
                Ok(deleted) if deleted > 0 => {
                    tracing::info!(deleted, "pruned old snapshots");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "snapshot cleanup failed"),
            }
        }
    }
}
