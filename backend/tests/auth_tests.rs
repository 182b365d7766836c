//! Authentication and access-control tests
//!
//! Policy decisions are checked exhaustively; router checks run against a
//! lazily connected pool because every request here is refused before any
//! query is issued.

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use proptest::prelude::*;
use shared::{AccessPolicy, Role};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use vendorpulse_backend::{
    create_app, services::auth::issue_access_token, AppState, Config,
};

const SECRET: &str = "test-secret";

fn app() -> Router {
    let config = Config::for_tests(SECRET);
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&config.database.url)
        .unwrap();

    create_app(AppState {
        db,
        config: Arc::new(config),
    })
}

fn token(role: Option<Role>) -> String {
    issue_access_token(Uuid::new_v4(), "tester", role, SECRET, 3600).unwrap()
}

fn request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn error_code(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    body["error"]["code"].as_str().unwrap_or_default().to_string()
}

// ============================================================================
// Policy Tests
// ============================================================================

#[cfg(test)]
mod policy_tests {
    use super::*;

    fn role_strategy() -> impl Strategy<Value = Option<Role>> {
        prop_oneof![
            Just(None),
            Just(Some(Role::Admin)),
            Just(Some(Role::Ops)),
            Just(Some(Role::Supplier)),
        ]
    }

    fn policy_strategy() -> impl Strategy<Value = AccessPolicy> {
        prop_oneof![
            Just(AccessPolicy::AdminOnly),
            Just(AccessPolicy::AdminOrOps),
            Just(AccessPolicy::AdminOrSupplier),
            Just(AccessPolicy::AnyRole),
        ]
    }

    #[test]
    fn test_policy_matrix() {
        use AccessPolicy::*;

        let cases = [
            (AdminOnly, [true, false, false]),
            (AdminOrOps, [true, true, false]),
            (AdminOrSupplier, [true, false, true]),
            (AnyRole, [true, true, true]),
        ];

        for (policy, expected) in cases {
            let actual = [
                policy.allows(Some(Role::Admin)),
                policy.allows(Some(Role::Ops)),
                policy.allows(Some(Role::Supplier)),
            ];
            assert_eq!(actual, expected, "{:?}", policy);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Admins pass every policy
        #[test]
        fn prop_admin_always_allowed(policy in policy_strategy()) {
            prop_assert!(policy.allows(Some(Role::Admin)));
        }

        /// Accounts without a profile fail every policy
        #[test]
        fn prop_missing_profile_always_denied(policy in policy_strategy()) {
            prop_assert!(!policy.allows(None));
        }

        /// AnyRole is the weakest policy: whoever passes another passes it too
        #[test]
        fn prop_any_role_is_weakest(policy in policy_strategy(), role in role_strategy()) {
            if policy.allows(role) {
                prop_assert!(AccessPolicy::AnyRole.allows(role));
            }
        }
    }
}

// ============================================================================
// Router Tests
// ============================================================================

#[cfg(test)]
mod router_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/purchase-orders", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/me", Some("not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_expired_token_is_reported() {
        let expired =
            issue_access_token(Uuid::new_v4(), "tester", Some(Role::Admin), SECRET, -3600)
                .unwrap();
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/suppliers", Some(&expired)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await, "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_supplier_cannot_approve() {
        let uri = format!("/api/v1/purchase-orders/{}/approve", Uuid::new_v4());
        let response = app()
            .oneshot(request(Method::POST, &uri, Some(&token(Some(Role::Supplier)))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(response).await, "INSUFFICIENT_PERMISSIONS");
    }

    #[tokio::test]
    async fn test_ops_cannot_deliver_or_recalculate() {
        let ops = token(Some(Role::Ops));
        let deliver = format!("/api/v1/purchase-orders/{}/delivered", Uuid::new_v4());

        for uri in [deliver.as_str(), "/api/v1/vendor-scores/recalculate"] {
            let response = app()
                .oneshot(request(Method::POST, uri, Some(&ops)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_profileless_user_is_forbidden_from_role_gated_routes() {
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/suppliers", Some(&token(None))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_supplier_cannot_read_reports_or_payments() {
        let supplier = token(Some(Role::Supplier));

        for uri in [
            "/api/v1/reports/stock-levels",
            "/api/v1/reports/purchases?filter_type=week",
            "/api/v1/payments",
            "/api/v1/users",
        ] {
            let response = app()
                .oneshot(request(Method::GET, uri, Some(&supplier)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let foreign =
            issue_access_token(Uuid::new_v4(), "tester", Some(Role::Admin), "other", 3600)
                .unwrap();
        let response = app()
            .oneshot(request(Method::GET, "/api/v1/vendor-scores", Some(&foreign)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
