use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Serialize)]
struct LoginResponse {
    success: bool,
    user: Option<User>,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Json<LoginResponse> {
    let mut auth = state.auth.write().await;
    let success = auth.login(&payload.identifier, &payload.secret).await;

    let outcome = if success { "success" } else { "failure" };
    state
        .metrics
        .login_attempts_total
        .with_label_values(&[outcome])
        .inc();

    Json(LoginResponse {
        success,
        user: auth.session().user.clone(),
    })
}

async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.auth.write().await.logout().await;
    StatusCode::NO_CONTENT
}

#[derive(Serialize)]
struct SessionView {
    authenticated: bool,
    is_loading: bool,
    user: Option<User>,
}

async fn session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let auth = state.auth.read().await;
    let session = auth.session();
    Json(SessionView {
        authenticated: session.is_authenticated(),
        is_loading: session.is_loading,
        user: session.user.clone(),
    })
}
