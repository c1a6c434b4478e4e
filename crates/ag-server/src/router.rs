//! Router configuration.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::routes::{auth::auth_router, users::users_router};
use crate::state::AppState;

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let health = Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check));

    Router::new()
        .route("/", get(root))
        .merge(health)
        .merge(auth_router())
        .nest("/users", users_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Service status message.
#[derive(Serialize)]
pub struct StatusMessage {
    message: String,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Root endpoint handler.
async fn root(State(state): State<AppState>) -> Json<StatusMessage> {
    Json(StatusMessage {
        message: format!("{} is running!", state.config().app_name),
    })
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Liveness probe.
async fn liveness_check() -> StatusCode {
    StatusCode::OK
}
