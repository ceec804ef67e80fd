use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::users::{LoginRequest, RegisterRequest, TokenResponse};

pub const REGISTER: &str = "/auth/register";
pub const LOGIN: &str = "/auth/login";
pub const ADMIN_LOGIN: &str = "/auth/admin/login";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(REGISTER, post(register))
        .route(LOGIN, post(login))
        .route(ADMIN_LOGIN, post(admin_login))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<ApiResponse<TokenResponse>, ApiError> {
    Ok(ApiResponse::ok(state.users.register(req).await?))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<ApiResponse<TokenResponse>, ApiError> {
    Ok(ApiResponse::ok(state.users.login(req).await?))
}

async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<ApiResponse<TokenResponse>, ApiError> {
    Ok(ApiResponse::ok(state.users.admin_login(req).await?))
}
