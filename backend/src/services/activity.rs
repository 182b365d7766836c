//! Audit trail of user account activity

use serde_json::Value;
use shared::ActivityAction;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::ClientInfo;

/// One activity log entry before it is written
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub user_id: Option<Uuid>,
    pub action: ActivityAction,
    pub success: bool,
    pub username_attempted: Option<String>,
    pub details: Option<Value>,
}

impl ActivityRecord {
    pub fn new(action: ActivityAction, user_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            action,
            success: true,
            username_attempted: None,
            details: None,
        }
    }

    /// A rejected login for `username`
    pub fn failed_login(username: &str, user_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            action: ActivityAction::FailedLogin,
            success: false,
            username_attempted: Some(username.to_string()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Clone)]
pub struct ActivityService {
    db: PgPool,
}

impl ActivityService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an entry to `user_activity_logs`
    pub async fn record(&self, record: ActivityRecord, client: &ClientInfo) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_activity_logs
                (user_id, action, ip_address, user_agent, username_attempted, success, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.user_id)
        .bind(record.action.as_str())
        .bind(&client.ip_address)
        .bind(&client.user_agent)
        .bind(&record.username_attempted)
        .bind(record.success)
        .bind(&record.details)
        .execute(&self.db)
        .await?;

        tracing::debug!(
            action = record.action.as_str(),
            user_id = ?record.user_id,
            success = record.success,
            "activity recorded"
        );

        Ok(())
    }
}
