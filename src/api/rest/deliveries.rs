use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::delivery::{DeliveryRecord, DeliveryStatus};
use crate::state::AppState;
use crate::store::Table;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/deliveries", get(list_deliveries).post(create_delivery))
}

async fn list_deliveries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DeliveryRecord>>, AppError> {
    let rows = state.store.select(Table::Deliveries).await?;
    let deliveries = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    Ok(Json(deliveries))
}

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub date: NaiveDate,
    pub time: String,
    pub driver: String,
    pub vehicle: String,
    pub origin: String,
    pub destination: String,
    #[serde(default = "default_status")]
    pub status: DeliveryStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_status() -> DeliveryStatus {
    DeliveryStatus::Planned
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDeliveryRequest>,
) -> Result<Json<DeliveryRecord>, AppError> {
    if !state
        .auth
        .read()
        .await
        .has_action_permission("deliveries.create")
    {
        state
            .metrics
            .permission_denials_total
            .with_label_values(&["deliveries.create"])
            .inc();
        return Err(AppError::Forbidden(
            "deliveries.create requires a permitted role".to_string(),
        ));
    }

    if payload.origin.trim().is_empty() || payload.destination.trim().is_empty() {
        return Err(AppError::BadRequest(
            "origin and destination cannot be empty".to_string(),
        ));
    }

    let delivery = DeliveryRecord {
        id: Uuid::new_v4(),
        date: payload.date,
        time: payload.time,
        driver: payload.driver,
        vehicle: payload.vehicle,
        origin: payload.origin,
        destination: payload.destination,
        status: payload.status,
        notes: payload.notes,
    };

    let row = serde_json::to_value(&delivery)
        .map_err(|err| AppError::Internal(format!("failed to encode delivery: {err}")))?;
    state.store.insert(Table::Deliveries, row).await?;

    Ok(Json(delivery))
}
