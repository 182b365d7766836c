//! User account administration

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{validate_password, validate_phone, validate_username, ActivityAction, Role};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::BootstrapConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::ClientInfo;
use crate::services::activity::{ActivityRecord, ActivityService};

#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// Account as listed to administrators; `role` is absent without a profile
#[derive(Debug, Clone, Serialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    is_active: bool,
    role: Option<String>,
    phone: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserAccount {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
            role: row.role.as_deref().map(str::parse::<Role>).transpose()?,
            phone: row.phone,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordInput {
    pub new_password: String,
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.is_active,
           p.role, p.phone, u.last_login_at, u.created_at
    FROM users u
    LEFT JOIN user_profiles p ON p.user_id = u.id
"#;

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<UserAccount> {
        sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?
            .try_into()
    }

    pub async fn list(&self) -> AppResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} ORDER BY u.username"))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(UserAccount::try_from).collect()
    }

    /// Create an Ops or Supplier account together with its profile
    pub async fn create(
        &self,
        input: CreateUserInput,
        created_by: Uuid,
        client: &ClientInfo,
    ) -> AppResult<UserAccount> {
        input.validate()?;
        validate_username(&input.username).map_err(|m| AppError::invalid("username", m))?;
        validate_password(&input.password).map_err(|m| AppError::invalid("password", m))?;
        if let Some(phone) = input.phone.as_deref() {
            validate_phone(phone).map_err(|m| AppError::invalid("phone", m))?;
        }
        if !input.role.is_assignable() {
            return Err(AppError::invalid("role", "Role must be SUPPLIER or OPS"));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.first_name.as_deref().unwrap_or(""))
        .bind(input.last_name.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, "username"))?;

        sqlx::query("INSERT INTO user_profiles (user_id, role, phone) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(input.role.as_str())
            .bind(&input.phone)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        ActivityService::new(self.db.clone())
            .record(
                ActivityRecord::new(ActivityAction::AccountCreated, Some(user_id))
                    .with_details(json!({ "created_by": created_by })),
                client,
            )
            .await?;

        tracing::info!(%user_id, role = input.role.as_str(), "user account created");

        self.get(user_id).await
    }

    /// Flip an account's active flag. Administrators cannot deactivate themselves.
    pub async fn toggle_active(
        &self,
        user_id: Uuid,
        admin_id: Uuid,
        client: &ClientInfo,
    ) -> AppResult<UserAccount> {
        if user_id == admin_id {
            return Err(AppError::ValidationError(
                "Cannot deactivate your own account".to_string(),
            ));
        }

        let is_active = sqlx::query_scalar::<_, bool>(
            "UPDATE users SET is_active = NOT is_active WHERE id = $1 RETURNING is_active",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if !is_active {
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
            )
            .bind(user_id)
            .execute(&self.db)
            .await?;
        }

        ActivityService::new(self.db.clone())
            .record(
                ActivityRecord::new(ActivityAction::for_status_change(is_active), Some(user_id))
                    .with_details(json!({ "changed_by": admin_id })),
                client,
            )
            .await?;

        tracing::info!(%user_id, is_active, "user status changed");

        self.get(user_id).await
    }

    pub async fn reset_password(
        &self,
        user_id: Uuid,
        input: ResetPasswordInput,
        admin_id: Uuid,
        client: &ClientInfo,
    ) -> AppResult<()> {
        validate_password(&input.new_password)
            .map_err(|m| AppError::invalid("new_password", m))?;

        let password_hash = hash(&input.new_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&password_hash)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        ActivityService::new(self.db.clone())
            .record(
                ActivityRecord::new(ActivityAction::PasswordReset, Some(user_id))
                    .with_details(json!({ "reset_by": admin_id })),
                client,
            )
            .await?;

        Ok(())
    }

    /// Create the first administrator when no Admin profile exists yet.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<bool> {
        let has_admin = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM user_profiles WHERE role = 'ADMIN')",
        )
        .fetch_one(&self.db)
        .await?;

        if has_admin {
            return Ok(false);
        }

        validate_password(&bootstrap.admin_password)
            .map_err(|m| AppError::invalid("admin_password", m))?;
        let password_hash = hash(&bootstrap.admin_password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&bootstrap.admin_username)
        .bind(&bootstrap.admin_email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, "username"))?;

        sqlx::query("INSERT INTO user_profiles (user_id, role) VALUES ($1, $2)")
            .bind(user_id)
            .bind(Role::Admin.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%user_id, username = %bootstrap.admin_username, "bootstrap admin created");

        Ok(true)
    }
}
