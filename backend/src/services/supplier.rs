//! Supplier registry

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::VendorMetrics;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub supplier_name: String,
    pub contact_email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub user_id: Option<Uuid>,
}

/// Supplier with its latest score; metrics are zero until the first recalculation
#[derive(Debug, Clone, Serialize)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    #[serde(flatten)]
    pub metrics: VendorMetrics,
    pub last_calculated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct SupplierDetailRow {
    id: Uuid,
    supplier_name: String,
    contact_email: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
    is_active: bool,
    user_id: Option<Uuid>,
    score: Option<Decimal>,
    on_time_rate: Option<Decimal>,
    avg_approval_hours: Option<Decimal>,
    dispute_rate: Option<Decimal>,
    completion_rate: Option<Decimal>,
    last_calculated_at: Option<DateTime<Utc>>,
}

impl From<SupplierDetailRow> for SupplierDetail {
    fn from(row: SupplierDetailRow) -> Self {
        let zero = Decimal::ZERO;
        SupplierDetail {
            supplier: Supplier {
                id: row.id,
                supplier_name: row.supplier_name,
                contact_email: row.contact_email,
                phone_number: row.phone_number,
                address: row.address,
                is_active: row.is_active,
                user_id: row.user_id,
            },
            metrics: VendorMetrics {
                score: row.score.unwrap_or(zero),
                on_time_rate: row.on_time_rate.unwrap_or(zero),
                avg_approval_hours: row.avg_approval_hours.unwrap_or(zero),
                dispute_rate: row.dispute_rate.unwrap_or(zero),
                completion_rate: row.completion_rate.unwrap_or(zero),
            },
            last_calculated_at: row.last_calculated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 100, message = "Supplier name must be 1-100 characters"))]
    pub supplier_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 100, message = "Supplier name must be 1-100 characters"))]
    pub supplier_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

const SUPPLIER_COLUMNS: &str =
    "id, supplier_name, contact_email, phone_number, address, is_active, user_id";

/// Resolve the account that should hear about a supplier's orders: the linked
/// user, otherwise the user whose email matches the supplier contact email.
pub async fn resolve_supplier_user(
    conn: &mut PgConnection,
    supplier_id: Uuid,
) -> AppResult<Option<Uuid>> {
    let user_id = sqlx::query_scalar::<_, Option<Uuid>>(
        r#"
        SELECT COALESCE(
            s.user_id,
            (SELECT u.id FROM users u
             WHERE s.contact_email IS NOT NULL AND LOWER(u.email) = LOWER(s.contact_email)
             ORDER BY u.created_at, u.id
             LIMIT 1)
        )
        FROM suppliers s
        WHERE s.id = $1
        "#,
    )
    .bind(supplier_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user_id.flatten())
}

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, include_inactive: bool) -> AppResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE ($1 OR is_active) ORDER BY supplier_name, id"
        ))
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(suppliers)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<SupplierDetail> {
        let row = sqlx::query_as::<_, SupplierDetailRow>(
            r#"
            SELECT s.id, s.supplier_name, s.contact_email, s.phone_number, s.address,
                   s.is_active, s.user_id,
                   vs.score, vs.on_time_rate, vs.avg_approval_hours, vs.dispute_rate,
                   vs.completion_rate, vs.last_calculated_at
            FROM suppliers s
            LEFT JOIN vendor_scores vs ON vs.supplier_id = s.id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(row.into())
    }

    /// The supplier record linked to a user account, if any
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(supplier)
    }

    /// Supplier id a supplier-role user acts for; an unlinked supplier user may not act
    pub async fn require_own_supplier(&self, user_id: Uuid) -> AppResult<Uuid> {
        self.find_by_user(user_id)
            .await?
            .map(|s| s.id)
            .ok_or(AppError::InsufficientPermissions)
    }

    pub async fn create(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        input.validate()?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (supplier_name, contact_email, phone_number, address, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(input.supplier_name.trim())
        .bind(&input.contact_email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.user_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::unique_violation(e, "user_id"))?;

        tracing::info!(supplier_id = %supplier.id, "supplier created");

        Ok(supplier)
    }

    pub async fn update(&self, id: Uuid, input: UpdateSupplierInput) -> AppResult<Supplier> {
        input.validate()?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers SET
                supplier_name = COALESCE($2, supplier_name),
                contact_email = COALESCE($3, contact_email),
                phone_number = COALESCE($4, phone_number),
                address = COALESCE($5, address),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(input.supplier_name.as_deref().map(str::trim))
        .bind(&input.contact_email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.is_active)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(supplier)
    }

    /// Suppliers are never hard-deleted; this clears the active flag
    pub async fn deactivate(&self, id: Uuid) -> AppResult<Supplier> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            "UPDATE suppliers SET is_active = false WHERE id = $1 RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        tracing::info!(supplier_id = %id, "supplier deactivated");

        Ok(supplier)
    }
}
