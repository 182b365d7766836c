//! Payment and invoice handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use shared::{AccessPolicy, ApiResponse, InvoiceStatus};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{authorize, CurrentUser};
use crate::services::finance::{
    CreateInvoiceInput, CreatePaymentInput, PurchaseInvoice, SupplierPayment,
    UpdateInvoiceStatusInput,
};
use crate::services::FinanceService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListPaymentsQuery {
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
}

// ============================================================================
// Payments
// ============================================================================

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListPaymentsQuery>,
) -> AppResult<Json<ApiResponse<Vec<SupplierPayment>>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let payments = FinanceService::new(state.db)
        .list_payments(query.supplier_id)
        .await?;
    Ok(Json(ApiResponse::ok(payments, "Payments retrieved")))
}

pub async fn get_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupplierPayment>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let payment = FinanceService::new(state.db).get_payment(payment_id).await?;
    Ok(Json(ApiResponse::ok(payment, "Payment retrieved")))
}

pub async fn create_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreatePaymentInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<SupplierPayment>>)> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let payment = FinanceService::new(state.db).create_payment(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(payment, "Payment recorded successfully")),
    ))
}

// ============================================================================
// Invoices
// ============================================================================

pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListInvoicesQuery>,
) -> AppResult<Json<ApiResponse<Vec<PurchaseInvoice>>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()?;

    let invoices = FinanceService::new(state.db).list_invoices(status).await?;
    Ok(Json(ApiResponse::ok(invoices, "Invoices retrieved")))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PurchaseInvoice>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let invoice = FinanceService::new(state.db).get_invoice(invoice_id).await?;
    Ok(Json(ApiResponse::ok(invoice, "Invoice retrieved")))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateInvoiceInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<PurchaseInvoice>>)> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let invoice = FinanceService::new(state.db).create_invoice(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(invoice, "Invoice created successfully")),
    ))
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<UpdateInvoiceStatusInput>,
) -> AppResult<Json<ApiResponse<PurchaseInvoice>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let invoice = FinanceService::new(state.db)
        .update_invoice_status(invoice_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(invoice, "Invoice status updated")))
}
