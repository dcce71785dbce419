use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::route::OptimizedRoute;
use crate::models::GeoPoint;
use crate::state::AppState;
use crate::store::Table;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/routes", get(list_routes).post(create_route))
}

async fn list_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OptimizedRoute>>, AppError> {
    let rows = state.store.select(Table::Routes).await?;
    let routes = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    Ok(Json(routes))
}

#[derive(Deserialize)]
pub struct CreateRouteRequest {
    pub origin: String,
    pub destination: String,
    pub vehicle: String,
    pub driver: String,
    pub distance_km: f64,
    pub original_duration_min: u32,
    pub optimized_duration_min: u32,
    pub time_saved_min: u32,
    pub coordinates: Vec<GeoPoint>,
}

async fn create_route(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRouteRequest>,
) -> Result<Json<OptimizedRoute>, AppError> {
    if !state
        .auth
        .read()
        .await
        .has_action_permission("routes.create")
    {
        state
            .metrics
            .permission_denials_total
            .with_label_values(&["routes.create"])
            .inc();
        return Err(AppError::Forbidden(
            "routes.create requires a permitted role".to_string(),
        ));
    }

    if payload.coordinates.len() < 2 {
        return Err(AppError::BadRequest(
            "a route needs at least two coordinates".to_string(),
        ));
    }

    let route = OptimizedRoute {
        id: Uuid::new_v4(),
        origin: payload.origin,
        destination: payload.destination,
        vehicle: payload.vehicle,
        driver: payload.driver,
        distance_km: payload.distance_km,
        original_duration_min: payload.original_duration_min,
        optimized_duration_min: payload.optimized_duration_min,
        time_saved_min: payload.time_saved_min,
        coordinates: payload.coordinates,
    };

    let row = serde_json::to_value(&route)
        .map_err(|err| AppError::Internal(format!("failed to encode route: {err}")))?;
    state.store.insert(Table::Routes, row).await?;

    Ok(Json(route))
}
