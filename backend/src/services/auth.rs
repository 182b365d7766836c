//! Authentication service for login, token refresh and logout

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{ActivityAction, Role, UserProfile};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::ClientInfo;
use crate::services::activity::{ActivityRecord, ActivityService};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    /// Absent for accounts without a profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Logged-in user summary returned with the tokens
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub user: LoginUser,
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    password_hash: String,
    is_active: bool,
    role: Option<String>,
    phone: Option<String>,
}

impl CredentialRow {
    fn profile(&self) -> AppResult<Option<UserProfile>> {
        let Some(role) = self.role.as_deref() else {
            return Ok(None);
        };
        Ok(Some(UserProfile {
            role: role.parse()?,
            phone: self.phone.clone(),
        }))
    }
}

/// Decode and validate an access token
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Sign an access token for a user
pub fn issue_access_token(
    user_id: Uuid,
    username: &str,
    role: Option<Role>,
    secret: &str,
    expiry_seconds: i64,
) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.map(|r| r.as_str().to_string()),
        exp: (now + Duration::seconds(expiry_seconds)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// SHA-256 hex digest under which refresh tokens are stored
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

impl AuthService {
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Authenticate with username and password.
    ///
    /// Every attempt is written to the activity log; failures record the
    /// attempted username.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AppResult<LoginResult> {
        let activity = ActivityService::new(self.db.clone());

        let user = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.is_active, p.role, p.phone
            FROM users u
            LEFT JOIN user_profiles p ON p.user_id = u.id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        let Some(user) = user else {
            activity
                .record(ActivityRecord::failed_login(username, None), client)
                .await?;
            return Err(AppError::InvalidCredentials);
        };

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid || !user.is_active {
            activity
                .record(ActivityRecord::failed_login(username, Some(user.id)), client)
                .await?;
            tracing::warn!(username, "failed login");
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let profile = user.profile()?;
        let role = profile.as_ref().map(|p| p.role);
        let tokens = self.generate_tokens(user.id, &user.username, role)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        activity
            .record(ActivityRecord::new(ActivityAction::Login, Some(user.id)), client)
            .await?;
        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginResult {
            tokens,
            user: LoginUser {
                id: user.id,
                username: user.username,
                email: user.email,
                role,
                phone: profile.and_then(|p| p.phone),
            },
        })
    }

    /// Rotate a refresh token: the presented token is revoked and a new pair issued
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);
        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
            r#"
            SELECT u.id, u.username, p.role
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            LEFT JOIN user_profiles p ON p.user_id = u.id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            FOR UPDATE OF rt
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".into()))?;

        let (user_id, username, role) = user;
        let role = role.as_deref().map(str::parse::<Role>).transpose()?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&mut *tx)
            .await?;

        let tokens = self.generate_tokens(user_id, &username, role)?;

        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(hash_token(&tokens.refresh_token))
        .bind(Utc::now() + Duration::seconds(self.refresh_token_expiry))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(tokens)
    }

    /// Revoke the caller's refresh token and record the logout
    pub async fn logout(
        &self,
        user_id: Uuid,
        refresh_token: Option<&str>,
        client: &ClientInfo,
    ) -> AppResult<()> {
        if let Some(token) = refresh_token {
            sqlx::query(
                r#"
                UPDATE refresh_tokens SET revoked_at = NOW()
                WHERE token_hash = $1 AND user_id = $2 AND revoked_at IS NULL
                "#,
            )
            .bind(hash_token(token))
            .bind(user_id)
            .execute(&self.db)
            .await?;
        }

        ActivityService::new(self.db.clone())
            .record(ActivityRecord::new(ActivityAction::Logout, Some(user_id)), client)
            .await?;

        Ok(())
    }

    fn generate_tokens(
        &self,
        user_id: Uuid,
        username: &str,
        role: Option<Role>,
    ) -> AppResult<AuthTokens> {
        let access_token = issue_access_token(
            user_id,
            username,
            role,
            &self.jwt_secret,
            self.access_token_expiry,
        )?;

        Ok(AuthTokens {
            access_token,
            refresh_token: Uuid::new_v4().to_string(),
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(hash_token(token))
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hash_is_sha256_hex() {
        let digest = hash_token("refresh");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token("refresh"));
        assert_ne!(digest, hash_token("refresh2"));
    }

    #[test]
    fn test_access_token_round_trip() {
        let id = Uuid::new_v4();
        let token = issue_access_token(id, "ops", Some(Role::Ops), "secret", 60).unwrap();
        let claims = decode_access_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.role.as_deref(), Some("OPS"));
        assert!(matches!(
            decode_access_token(&token, "other"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let token = issue_access_token(Uuid::new_v4(), "ops", None, "secret", -3600).unwrap();
        assert!(matches!(
            decode_access_token(&token, "secret"),
            Err(AppError::TokenExpired)
        ));
    }
}
