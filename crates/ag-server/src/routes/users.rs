//! User and group queries for authenticated callers.

use ag_directory::{DirectoryError, UserInfo, validation::validate_group_name};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

/// Successful group membership check.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupCheckResponse {
    /// Group name.
    pub group: String,
    /// Member that was checked.
    pub member: String,
    /// Always `authorized`.
    pub status: String,
}

/// Creates the user router, mounted under `/users`.
pub fn users_router() -> Router<AppState> {
    Router::new()
        .route("/details", get(user_details))
        .route("/group-check/{group}", get(check_user_in_group))
        .route("/group-users/{group}", get(group_users))
}

/// Returns the user data embedded in the caller's token.
pub async fn user_details(
    AuthenticatedUser(payload): AuthenticatedUser,
) -> ApiResult<Json<UserInfo>> {
    if payload.user.is_empty() {
        return Err(ApiError::unauthorized("User info missing in token"));
    }
    let user: UserInfo = payload.user_as()?;
    tracing::debug!(sub = ?payload.sub, "user details requested");
    Ok(Json(user))
}

/// Succeeds only when the caller is a member of `group`.
pub async fn check_user_in_group(
    State(state): State<AppState>,
    AuthenticatedUser(payload): AuthenticatedUser,
    Path(group): Path<String>,
) -> ApiResult<Json<GroupCheckResponse>> {
    validate_group_name(&group)?;
    let username = payload
        .sub
        .ok_or_else(|| ApiError::unauthorized("Username missing in token"))?;

    if !state.credentials.check_group_membership(&group, &username).await? {
        tracing::warn!(%username, %group, "user is not a group member");
        return Err(ApiError::Forbidden("User not in group".to_string()));
    }

    tracing::info!(%username, %group, "group membership confirmed");
    Ok(Json(GroupCheckResponse {
        group,
        member: username,
        status: "authorized".to_string(),
    }))
}

/// Lists the members of `group`.
pub async fn group_users(
    State(state): State<AppState>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(group): Path<String>,
) -> ApiResult<Json<Vec<UserInfo>>> {
    validate_group_name(&group)?;
    let users = state.credentials.get_all_users_in_group(&group).await?;
    if users.is_empty() {
        return Err(DirectoryError::GroupNotFound(group).into());
    }

    tracing::info!(%group, count = users.len(), "group members listed");
    Ok(Json(users))
}
