//! Authentication handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use shared::ApiResponse;

use crate::error::AppResult;
use crate::middleware::{ClientInfo, CurrentUser};
use crate::services::auth::{AuthTokens, LoginResult};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResult>>> {
    let auth_service = AuthService::new(state.db, &state.config);
    let result = auth_service
        .login(body.username.trim(), &body.password, &client)
        .await?;

    Ok(Json(ApiResponse::ok(result, "Login successful")))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<ApiResponse<AuthTokens>>> {
    let auth_service = AuthService::new(state.db, &state.config);
    let tokens = auth_service.refresh_token(&body.refresh_token).await?;

    Ok(Json(ApiResponse::ok(tokens, "Token refreshed")))
}

/// Logout endpoint handler; the body is optional
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    client: ClientInfo,
    body: Option<Json<LogoutRequest>>,
) -> AppResult<Json<ApiResponse<()>>> {
    let refresh_token = body.and_then(|Json(b)| b.refresh_token);

    AuthService::new(state.db, &state.config)
        .logout(user.user_id, refresh_token.as_deref(), &client)
        .await?;

    Ok(Json(ApiResponse::message("Logout successful")))
}
