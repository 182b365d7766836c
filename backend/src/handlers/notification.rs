//! HTTP handlers for the caller's notifications

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::ApiResponse;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::Notification;
use crate::services::NotificationService;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub async fn get_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let service = NotificationService::new(state.db);
    let notifications = service
        .list(current_user.0.user_id, query.unread_only.unwrap_or(false))
        .await?;
    Ok(Json(ApiResponse::ok(notifications, "Notifications retrieved")))
}

pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let service = NotificationService::new(state.db);
    let count = service.unread_count(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { count }, "Unread count")))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    let service = NotificationService::new(state.db);
    service
        .mark_as_read(current_user.0.user_id, notification_id)
        .await?;
    Ok(Json(ApiResponse::message("Notification marked as read")))
}

pub async fn mark_all_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let service = NotificationService::new(state.db);
    let updated = service.mark_all_as_read(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::ok(
        MarkAllReadResponse { updated },
        "All notifications marked as read",
    )))
}
