//! Reporting handlers with CSV export

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use shared::{parse_report_date, AccessPolicy, ApiResponse, ReportPeriod};

use crate::error::AppResult;
use crate::middleware::{authorize, CurrentUser};
use crate::services::reporting::{PurchaseTotals, StockReport, SupplierSummary};
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseReportQuery {
    pub filter_type: Option<String>,
    pub date: Option<String>,
}

/// Purchase total for the day, week, month or year around `date`
pub async fn get_purchase_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PurchaseReportQuery>,
) -> AppResult<Json<ApiResponse<PurchaseTotals>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let period = match query.filter_type.as_deref() {
        Some(raw) => raw.parse::<ReportPeriod>()?,
        None => ReportPeriod::default(),
    };
    let base = parse_report_date(query.date.as_deref(), Utc::now().date_naive());

    let totals = ReportingService::new(state.db)
        .purchases(period, base)
        .await?;
    Ok(Json(ApiResponse::ok(totals, "Purchase report")))
}

pub async fn get_stock_levels(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<StockReport>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let report = ReportingService::new(state.db).stock_levels().await?;
    Ok(Json(ApiResponse::ok(report, "Stock levels")))
}

pub async fn export_stock_levels_csv(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let report = ReportingService::new(state.db).stock_levels().await?;
    let csv = ReportingService::export_to_csv(&report.stock)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"stock_levels.csv\""),
        ],
        csv,
    ))
}

pub async fn get_supplier_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<SupplierSummary>>> {
    authorize(&user, AccessPolicy::AdminOrOps)?;

    let summary = ReportingService::new(state.db).supplier_summary().await?;
    Ok(Json(ApiResponse::ok(summary, "Supplier summary")))
}
