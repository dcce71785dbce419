use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::map::view::MapViewSnapshot;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/map/deliveries", get(delivery_snapshot))
        .route("/map/routes", get(route_snapshot))
}

async fn delivery_snapshot(State(state): State<Arc<AppState>>) -> Json<MapViewSnapshot> {
    Json(state.delivery_view.lock().await.snapshot())
}

async fn route_snapshot(State(state): State<Arc<AppState>>) -> Json<MapViewSnapshot> {
    Json(state.route_view.lock().await.snapshot())
}
