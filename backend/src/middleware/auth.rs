//! Authentication middleware
//!
//! Validates the bearer token, attaches an [`AuthUser`] to the request and
//! offers [`authorize`] for the per-handler role check.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use shared::{AccessPolicy, Role};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::decode_access_token;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    /// `None` when the account has no profile
    pub role: Option<Role>,
}

impl AuthUser {
    pub fn is_supplier(&self) -> bool {
        self.role == Some(Role::Supplier)
    }
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid Authorization header".into()))?;

    let claims = decode_access_token(token, &state.config.jwt.secret)?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;
    let role = claims
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|_| AppError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser {
        user_id,
        username: claims.username,
        role,
    });

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

/// Role guard for use at the top of handlers
pub fn authorize(user: &AuthUser, policy: AccessPolicy) -> AppResult<()> {
    if policy.allows(user.role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.user_id, ?policy, "access denied");
        Err(AppError::InsufficientPermissions)
    }
}
