//! Purchase order handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{AccessPolicy, ApiResponse, PurchaseOrderStatus};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::supplier_scope;
use crate::middleware::{authorize, CurrentUser};
use crate::services::purchase_order::{CreateOrderInput, DeliveryReport, PurchaseOrder};
use crate::services::PurchaseOrderService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

pub async fn list_purchase_orders(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<ApiResponse<Vec<PurchaseOrder>>>> {
    authorize(&user, AccessPolicy::AnyRole)?;
    let scope = supplier_scope(&state, &user).await?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PurchaseOrderStatus>)
        .transpose()?;

    let orders = PurchaseOrderService::new(state.db)
        .list(scope, status)
        .await?;
    Ok(Json(ApiResponse::ok(orders, "Purchase orders retrieved")))
}

pub async fn get_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseOrder>>> {
    authorize(&user, AccessPolicy::AnyRole)?;
    let scope = supplier_scope(&state, &user).await?;

    let order = PurchaseOrderService::new(state.db)
        .get(order_id, scope)
        .await?;
    Ok(Json(ApiResponse::ok(order, "Purchase order retrieved")))
}

pub async fn create_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<PurchaseOrder>>)> {
    authorize(&user, AccessPolicy::AdminOrSupplier)?;

    if let Some(own) = supplier_scope(&state, &user).await? {
        if input.supplier_id != own {
            return Err(AppError::InsufficientPermissions);
        }
    }

    let order = PurchaseOrderService::new(state.db)
        .create(input, user.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(order, "Purchase order created successfully")),
    ))
}

pub async fn approve_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseOrder>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let order = PurchaseOrderService::new(state.db).approve(order_id).await?;
    Ok(Json(ApiResponse::ok(order, "Purchase order approved")))
}

pub async fn reject_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseOrder>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let order = PurchaseOrderService::new(state.db).reject(order_id).await?;
    Ok(Json(ApiResponse::ok(order, "Purchase order rejected")))
}

/// Mark an approved order delivered and receive its stock
pub async fn deliver_purchase_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeliveryReport>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let report = PurchaseOrderService::new(state.db).deliver(order_id).await?;
    Ok(Json(ApiResponse::ok(
        report,
        "Purchase order marked as delivered and stock updated",
    )))
}
