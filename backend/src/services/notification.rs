//! In-app notifications
//!
//! Writers take a `&mut PgConnection` so that notifications commit or roll
//! back together with the order or stock change that produced them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{low_stock_message, order_approved_message, NotificationType};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Notification as shown to its owner
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Option<Uuid>,
    notification_type: String,
    message: String,
    created_at: DateTime<Utc>,
    is_read: bool,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            notification_type: row.notification_type.parse()?,
            message: row.message,
            created_at: row.created_at,
            is_read: row.is_read,
        })
    }
}

/// Append a notification for one user
pub async fn create_notification(
    conn: &mut PgConnection,
    user_id: Option<Uuid>,
    kind: NotificationType,
    message: &str,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO notifications (user_id, notification_type, message) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(message)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Alert every administrator that a part is running low.
///
/// Returns the number of notifications written.
pub async fn notify_low_stock(
    conn: &mut PgConnection,
    part_id: Uuid,
    part_name: &str,
    current_stock: i32,
) -> AppResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, notification_type, message)
        SELECT u.id, $1, $2
        FROM users u
        JOIN user_profiles p ON p.user_id = u.id
        WHERE p.role = 'ADMIN'
        "#,
    )
    .bind(NotificationType::LowStock.as_str())
    .bind(low_stock_message(part_name, part_id, current_stock))
    .execute(&mut *conn)
    .await?;

    tracing::warn!(
        %part_id,
        current_stock,
        admins_notified = result.rows_affected(),
        "low stock"
    );

    Ok(result.rows_affected())
}

/// Tell a supplier's user that their order was approved
pub async fn notify_order_approved(
    conn: &mut PgConnection,
    supplier_user_id: Uuid,
    po_reference_number: &str,
) -> AppResult<()> {
    create_notification(
        conn,
        Some(supplier_user_id),
        NotificationType::OrderApproved,
        &order_approved_message(po_reference_number),
    )
    .await
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Notifications owned by a user, newest first
    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, notification_type, message, created_at, is_read
            FROM notifications
            WHERE user_id = $1 AND ($2 = false OR is_read = false)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        Ok(())
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
