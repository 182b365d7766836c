//! Route definitions for VendorPulse

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything except login, refresh and health sits
/// behind the bearer-token middleware.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes(state.clone()))
        .nest("/me", me_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/suppliers", supplier_routes(state.clone()))
        .nest("/parts", part_routes(state.clone()))
        .nest("/purchase-orders", purchase_order_routes(state.clone()))
        .nest("/notifications", notification_routes(state.clone()))
        .nest("/vendor-scores", vendor_score_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/purchase-invoices", invoice_routes(state.clone()))
        .nest("/reports", report_routes(state))
}

/// Authentication routes; logout needs a valid access token
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .merge(protected)
}

fn me_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// User administration routes (protected)
fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route("/:user_id/toggle", patch(handlers::toggle_user_status))
        .route("/:user_id/reset-password", post(handlers::reset_user_password))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier registry routes (protected)
fn supplier_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:supplier_id",
            get(handlers::get_supplier)
                .put(handlers::update_supplier)
                .delete(handlers::deactivate_supplier),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Spare part routes (protected)
fn part_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_parts).post(handlers::create_part))
        .route("/:part_id", get(handlers::get_part).put(handlers::update_part))
        .route("/:part_id/adjust-stock", post(handlers::adjust_stock))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Purchase order routes (protected)
fn purchase_order_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
        )
        .route("/:order_id", get(handlers::get_purchase_order))
        .route("/:order_id/approve", post(handlers::approve_purchase_order))
        .route("/:order_id/reject", post(handlers::reject_purchase_order))
        .route("/:order_id/delivered", post(handlers::deliver_purchase_order))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Notification routes (protected)
fn notification_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_notifications))
        .route("/unread-count", get(handlers::get_unread_count))
        .route("/mark-all-read", post(handlers::mark_all_as_read))
        .route("/:notification_id/read", post(handlers::mark_as_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Vendor score routes (protected)
fn vendor_score_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_vendor_scores))
        .route("/recalculate", post(handlers::recalculate_vendor_scores))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Supplier payment routes (protected)
fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_payments).post(handlers::create_payment))
        .route("/:payment_id", get(handlers::get_payment))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Purchase invoice routes (protected)
fn invoice_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_invoices).post(handlers::create_invoice))
        .route("/:invoice_id", get(handlers::get_invoice))
        .route("/:invoice_id/status", put(handlers::update_invoice_status))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Reporting routes (protected)
fn report_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/purchases", get(handlers::get_purchase_report))
        .route("/stock-levels", get(handlers::get_stock_levels))
        .route("/stock-levels.csv", get(handlers::export_stock_levels_csv))
        .route("/supplier-summary", get(handlers::get_supplier_summary))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
