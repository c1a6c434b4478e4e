//! Login, logout and token refresh.

use ag_directory::{DirectoryError, validation::validate_login_input};
use ag_token::{TokenError, TokenResponse};
use axum::{
    Form, Json, Router,
    extract::{
        State,
        rejection::{FormRejection, JsonRejection},
    },
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::BearerToken;
use crate::state::AppState;

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username (common name).
    pub username: String,
    /// Password.
    pub password: String,
}

/// Refresh request body.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    /// Refresh token to exchange.
    pub refresh_token: String,
}

/// Plain message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

/// Creates the authentication router.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
}

/// Authenticates against the directory and issues a token pair.
pub async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Form(form) =
        form.map_err(|_| DirectoryError::input("username and password are required"))?;
    validate_login_input(&form.username, &form.password)?;

    let user = state
        .credentials
        .authenticate_user(&form.username, &form.password)
        .await?;
    let tokens = state.tokens.create_tokens(&user)?;

    tracing::info!(username = %form.username, "login succeeded");
    Ok(Json(tokens))
}

/// Revokes the presented access token.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<MessageResponse>> {
    state.tokens.revoke_access_token(&token)?;
    tracing::info!("access token revoked on logout");
    Ok(Json(MessageResponse {
        message: "Token revoked successfully".to_string(),
    }))
}

/// Exchanges a refresh token for a new pair.
pub async fn refresh_token(
    State(state): State<AppState>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(body) = body.map_err(|_| TokenError::refresh_invalid("missing refresh_token"))?;
    let tokens = state.tokens.exchange_refresh_token(&body.refresh_token)?;
    tracing::info!("tokens refreshed");
    Ok(Json(tokens))
}
