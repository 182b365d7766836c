//! Spare part catalog handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{AccessPolicy, ApiResponse};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::supplier_scope;
use crate::middleware::{authorize, CurrentUser};
use crate::services::part::{AdjustStockInput, CreatePartInput, SparePart, StockLevel, UpdatePartInput};
use crate::services::PartService;
use crate::AppState;

pub async fn list_parts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<SparePart>>>> {
    authorize(&user, AccessPolicy::AnyRole)?;
    let scope = supplier_scope(&state, &user).await?;

    let parts = PartService::new(state.db).list(scope).await?;
    Ok(Json(ApiResponse::ok(parts, "Spare parts retrieved")))
}

pub async fn get_part(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(part_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SparePart>>> {
    authorize(&user, AccessPolicy::AnyRole)?;
    let scope = supplier_scope(&state, &user).await?;

    let part = PartService::new(state.db).get(part_id, scope).await?;
    Ok(Json(ApiResponse::ok(part, "Spare part retrieved")))
}

/// Suppliers always create parts under their own record
pub async fn create_part(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreatePartInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SparePart>>)> {
    authorize(&user, AccessPolicy::AdminOrSupplier)?;

    let supplier_id = match supplier_scope(&state, &user).await? {
        Some(own) => own,
        None => input
            .supplier_id
            .ok_or_else(|| AppError::invalid("supplier_id", "Supplier is required"))?,
    };

    let part = PartService::new(state.db).create(input, supplier_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(part, "Spare part created successfully")),
    ))
}

pub async fn update_part(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(part_id): Path<Uuid>,
    Json(input): Json<UpdatePartInput>,
) -> AppResult<Json<ApiResponse<SparePart>>> {
    authorize(&user, AccessPolicy::AdminOrSupplier)?;
    let scope = supplier_scope(&state, &user).await?;

    let part = PartService::new(state.db)
        .update(part_id, input, scope)
        .await?;
    Ok(Json(ApiResponse::ok(part, "Spare part updated successfully")))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(part_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<ApiResponse<StockLevel>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let level = PartService::new(state.db).adjust_stock(part_id, input).await?;
    Ok(Json(ApiResponse::ok(level, "Stock adjusted")))
}
