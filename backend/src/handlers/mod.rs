//! HTTP handlers for VendorPulse

pub mod auth;
pub mod finance;
pub mod health;
pub mod notification;
pub mod part;
pub mod purchase_order;
pub mod reporting;
pub mod supplier;
pub mod user;
pub mod vendor_score;

pub use auth::*;
pub use finance::*;
pub use health::*;
pub use notification::*;
pub use part::*;
pub use purchase_order::*;
pub use reporting::*;
pub use supplier::*;
pub use user::*;
pub use vendor_score::*;

use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::services::SupplierService;
use crate::AppState;

/// Supplier a request is confined to: the caller's own record for supplier
/// users, `None` (unrestricted) for everyone else
pub(crate) async fn supplier_scope(state: &AppState, user: &AuthUser) -> AppResult<Option<Uuid>> {
    if !user.is_supplier() {
        return Ok(None);
    }

    let supplier_id = SupplierService::new(state.db.clone())
        .require_own_supplier(user.user_id)
        .await?;

    Ok(Some(supplier_id))
}
