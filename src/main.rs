mod api;
mod auth;
mod config;
mod engine;
mod error;
mod geo;
mod map;
mod models;
mod observability;
mod state;
mod store;

use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::auth::session::BUILTIN_ACCOUNTS;
use crate::store::memory::{DemoSessions, MemoryStore};
use crate::store::{RowStore, Table};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store = Arc::new(MemoryStore::new(config.event_buffer_size));
    let sessions = Arc::new(DemoSessions::new());
    seed_demo_data(&store, &sessions).await?;

    let app_state = state::AppState::new(store, sessions, &config)
        .await
        .map_err(|err| error::AppError::Internal(format!("map setup failed: {err}")))?;
    let shared_state = Arc::new(app_state);

    tokio::spawn(engine::refresh::run_refresh_engine(shared_state.clone()));

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

/// Demo fixtures: the built-in operator accounts plus a few deliveries and
/// one optimized route so the map has something to show on first start.
async fn seed_demo_data(
    store: &Arc<MemoryStore>,
    sessions: &Arc<DemoSessions>,
) -> Result<(), error::AppError> {
    for account in BUILTIN_ACCOUNTS {
        sessions.register(account.email, "demo123");
    }
    if let Some(admin) = auth::session::builtin_user("admin@fleetboard.ma") {
        let row = serde_json::to_value(&admin)
            .map_err(|err| error::AppError::Internal(format!("failed to encode seed user: {err}")))?;
        store.insert(Table::Users, row).await?;
    }

    let deliveries = [
        json!({
            "id": Uuid::new_v4().to_string(),
            "date": "2026-08-06",
            "time": "08:30",
            "driver": "Hassan Alaoui",
            "vehicle": "TR-104",
            "origin": "Casablanca",
            "destination": "Rabat",
            "status": "in-progress"
        }),
        json!({
            "id": Uuid::new_v4().to_string(),
            "date": "2026-08-06",
            "time": "10:00",
            "driver": "Karim Tazi",
            "vehicle": "VAN-21",
            "origin": "Marrakech",
            "destination": "Agadir",
            "status": "planned"
        }),
    ];
    for delivery in deliveries {
        store.insert(Table::Deliveries, delivery).await?;
    }

    let route = json!({
        "id": Uuid::new_v4().to_string(),
        "origin": "Casablanca",
        "destination": "Tanger",
        "vehicle": "TR-104",
        "driver": "Hassan Alaoui",
        "distance_km": 338.0,
        "original_duration_min": 260,
        "optimized_duration_min": 228,
        "time_saved_min": 32,
        "coordinates": [
            { "lat": 33.5731, "lng": -7.5898 },
            { "lat": 34.2610, "lng": -6.5802 },
            { "lat": 35.0300, "lng": -6.0000 },
            { "lat": 35.7595, "lng": -5.8340 }
        ]
    });
    store.insert(Table::Routes, route).await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
