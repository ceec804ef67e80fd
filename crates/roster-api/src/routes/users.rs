use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use roster_auth::CurrentUser;
use serde::Deserialize;

use crate::error::ApiError;
use crate::response::{ApiResponse, Page};
use crate::state::AppState;
use crate::users::{ChangePasswordRequest, ListQuery, UpdateProfileRequest, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/password/change", put(change_password))
        .route("/user/admin", get(list_admins))
        .route("/user/admin/{id}", put(update_role))
        .route("/user/admin/lock/{id}", put(set_lock))
        .route("/user/{id}", get(profile).put(update_profile))
}

#[derive(Debug, Deserialize)]
struct RoleQuery {
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LockQuery {
    lock: Option<String>,
}

async fn profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<User>, ApiError> {
    Ok(ApiResponse::ok(state.users.profile(&user, &id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    Ok(ApiResponse::ok(
        state.users.update_profile(&user, &id, req).await?,
    ))
}

async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state.users.change_password(&user, req).await?;
    Ok(ApiResponse::message("Change password success!"))
}

async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Page<User>>, ApiError> {
    Ok(ApiResponse::ok(state.users.list(&user, query).await?))
}

async fn list_admins(State(state): State<AppState>) -> Result<ApiResponse<Vec<User>>, ApiError> {
    Ok(ApiResponse::ok(state.users.list_admins().await?))
}

async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<RoleQuery>,
) -> Result<ApiResponse<User>, ApiError> {
    Ok(ApiResponse::ok(
        state.users.update_role(&id, query.role.as_deref()).await?,
    ))
}

/// `?lock=true|false`; anything else is rejected before the store is touched.
async fn set_lock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LockQuery>,
) -> Result<ApiResponse<User>, ApiError> {
    let lock = match query.lock.as_deref() {
        Some("true") => true,
        Some("false") => false,
        _ => return Err(ApiError::bad_request("User lock status must be true/false")),
    };
    Ok(ApiResponse::ok(state.users.set_lock(&id, lock).await?))
}
