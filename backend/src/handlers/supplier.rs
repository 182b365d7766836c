//! Supplier registry handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{AccessPolicy, ApiResponse, Role};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{authorize, CurrentUser};
use crate::services::supplier::{CreateSupplierInput, Supplier, SupplierDetail, UpdateSupplierInput};
use crate::services::SupplierService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    pub include_inactive: Option<bool>,
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListSuppliersQuery>,
) -> AppResult<Json<ApiResponse<Vec<Supplier>>>> {
    authorize(&user, AccessPolicy::AnyRole)?;

    // Inactive suppliers are only shown to staff
    let include_inactive = query.include_inactive.unwrap_or(false)
        && matches!(user.role, Some(Role::Admin | Role::Ops));

    let suppliers = SupplierService::new(state.db).list(include_inactive).await?;
    Ok(Json(ApiResponse::ok(suppliers, "Suppliers retrieved")))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupplierDetail>>> {
    authorize(&user, AccessPolicy::AnyRole)?;

    let supplier = SupplierService::new(state.db).get(supplier_id).await?;
    Ok(Json(ApiResponse::ok(supplier, "Supplier retrieved")))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Supplier>>)> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let supplier = SupplierService::new(state.db).create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(supplier, "Supplier created successfully")),
    ))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let supplier = SupplierService::new(state.db)
        .update(supplier_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(supplier, "Supplier updated successfully")))
}

/// Soft delete: the supplier stays on record as inactive
pub async fn deactivate_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let supplier = SupplierService::new(state.db).deactivate(supplier_id).await?;
    Ok(Json(ApiResponse::ok(supplier, "Supplier deactivated")))
}
