pub mod auth;
pub mod deliveries;
pub mod map;
pub mod routes;
pub mod users;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(deliveries::router())
        .merge(routes::router())
        .merge(map::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    authenticated: bool,
    delivery_overlay_generation: u64,
    route_overlay_generation: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let authenticated = state.auth.read().await.session().is_authenticated();
    let delivery_overlay_generation = state.delivery_view.lock().await.generation();
    let route_overlay_generation = state.route_view.lock().await.generation();

    Json(HealthResponse {
        status: "ok",
        authenticated,
        delivery_overlay_generation,
        route_overlay_generation,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
