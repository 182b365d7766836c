//! User administration handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{AccessPolicy, ApiResponse};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{authorize, ClientInfo, CurrentUser};
use crate::services::user::{CreateUserInput, ResetPasswordInput, UserAccount};
use crate::services::UserService;
use crate::AppState;

/// The caller's own account; available to users without a profile too
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<UserAccount>>> {
    let account = UserService::new(state.db).get(user.user_id).await?;
    Ok(Json(ApiResponse::ok(account, "Current user")))
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<UserAccount>>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let users = UserService::new(state.db).list().await?;
    Ok(Json(ApiResponse::ok(users, "Users retrieved")))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    client: ClientInfo,
    Json(input): Json<CreateUserInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserAccount>>)> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let account = UserService::new(state.db)
        .create(input, user.user_id, &client)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(account, "User created successfully")),
    ))
}

/// Activate or deactivate an account
pub async fn toggle_user_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    client: ClientInfo,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserAccount>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let account = UserService::new(state.db)
        .toggle_active(user_id, user.user_id, &client)
        .await?;

    let message = if account.is_active {
        "User activated"
    } else {
        "User deactivated"
    };
    Ok(Json(ApiResponse::ok(account, message)))
}

pub async fn reset_user_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    client: ClientInfo,
    Path(user_id): Path<Uuid>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    UserService::new(state.db)
        .reset_password(user_id, input, user.user_id, &client)
        .await?;

    Ok(Json(ApiResponse::message("Password reset successfully")))
}
