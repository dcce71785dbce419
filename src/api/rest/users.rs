use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::Json;
use axum::Router;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::users::NewUser;
use crate::error::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let auth = state.auth.read().await;
    if !auth.can_access_route("/users") {
        return Err(AppError::Forbidden(
            "the users page requires an admin role".to_string(),
        ));
    }
    Ok(Json(auth.users().to_vec()))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewUser>,
) -> Result<Json<User>, AppError> {
    let mut auth = state.auth.write().await;
    let user = track_denial(&state, "users.create", auth.add_user(payload).await)?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch_body): Json<Value>,
) -> Result<Json<User>, AppError> {
    let mut auth = state.auth.write().await;
    let user = track_denial(&state, "users.update", auth.update_user(id, patch_body).await)?;
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let mut auth = state.auth.write().await;
    track_denial(&state, "users.delete", auth.delete_user(id).await)?;
    Ok(StatusCode::NO_CONTENT)
}

fn track_denial<T>(
    state: &AppState,
    action: &str,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if matches!(result, Err(AppError::Forbidden(_))) {
        state
            .metrics
            .permission_denials_total
            .with_label_values(&[action])
            .inc();
    }
    result
}
