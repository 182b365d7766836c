//! Vendor score handlers

use axum::{extract::State, Json};
use shared::{AccessPolicy, ApiResponse};

use crate::error::AppResult;
use crate::middleware::{authorize, CurrentUser};
use crate::services::vendor_score::{Recalculation, VendorScore};
use crate::services::VendorScoreService;
use crate::AppState;

pub async fn list_vendor_scores(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<VendorScore>>>> {
    authorize(&user, AccessPolicy::AnyRole)?;

    let scores = VendorScoreService::new(state.db).list().await?;
    Ok(Json(ApiResponse::ok(scores, "Vendor scores retrieved")))
}

pub async fn recalculate_vendor_scores(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ApiResponse<Recalculation>>> {
    authorize(&user, AccessPolicy::AdminOnly)?;

    let result = VendorScoreService::new(state.db).recalculate_all().await?;
    let message = format!("Updated {} vendor scores", result.updated);
    Ok(Json(ApiResponse::ok(result, message)))
}
