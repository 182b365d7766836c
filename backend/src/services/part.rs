//! Spare part catalog and manual stock adjustment

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{is_low_stock, validate_price, validate_sku, validate_stock_adjustment};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::notification::notify_low_stock;

#[derive(Clone)]
pub struct PartService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SparePart {
    pub id: Uuid,
    pub part_name: String,
    pub sku_code: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub current_stock: i32,
    pub supplier_id: Uuid,
    pub supplier_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePartInput {
    #[validate(length(min = 1, max = 100, message = "Part name must be 1-100 characters"))]
    pub part_name: String,
    pub sku_code: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub current_stock: i32,
    /// Ignored for supplier users, whose parts always belong to their own record
    pub supplier_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePartInput {
    #[validate(length(min = 1, max = 100, message = "Part name must be 1-100 characters"))]
    pub part_name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub delta: i32,
    pub reason: Option<String>,
}

/// Stock level after an adjustment
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StockLevel {
    pub id: Uuid,
    pub part_name: String,
    pub current_stock: i32,
}

const PART_SELECT: &str = r#"
    SELECT p.id, p.part_name, p.sku_code, p.description, p.unit_price, p.current_stock,
           p.supplier_id, s.supplier_name
    FROM spare_parts p
    JOIN suppliers s ON s.id = p.supplier_id
"#;

impl PartService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All parts, or only those of `supplier_id` when given
    pub async fn list(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<SparePart>> {
        let parts = sqlx::query_as::<_, SparePart>(&format!(
            "{PART_SELECT} WHERE ($1::uuid IS NULL OR p.supplier_id = $1) ORDER BY p.part_name, p.id"
        ))
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(parts)
    }

    /// Fetch a part; with `supplier_id` set, parts of other suppliers are not found
    pub async fn get(&self, id: Uuid, supplier_id: Option<Uuid>) -> AppResult<SparePart> {
        sqlx::query_as::<_, SparePart>(&format!(
            "{PART_SELECT} WHERE p.id = $1 AND ($2::uuid IS NULL OR p.supplier_id = $2)"
        ))
        .bind(id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Spare part".to_string()))
    }

    pub async fn create(&self, input: CreatePartInput, supplier_id: Uuid) -> AppResult<SparePart> {
        input.validate()?;
        validate_sku(&input.sku_code).map_err(|m| AppError::invalid("sku_code", m))?;
        validate_price(input.unit_price).map_err(|m| AppError::invalid("unit_price", m))?;
        if input.current_stock < 0 {
            return Err(AppError::invalid("current_stock", "Stock cannot be negative"));
        }

        let supplier_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(supplier_id)
                .fetch_one(&self.db)
                .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO spare_parts (part_name, sku_code, description, unit_price, current_stock, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.part_name.trim())
        .bind(input.sku_code.trim())
        .bind(&input.description)
        .bind(input.unit_price)
        .bind(input.current_stock)
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::unique_violation(e, "sku_code"))?;

        self.get(id, None).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        input: UpdatePartInput,
        supplier_id: Option<Uuid>,
    ) -> AppResult<SparePart> {
        input.validate()?;
        if let Some(price) = input.unit_price {
            validate_price(price).map_err(|m| AppError::invalid("unit_price", m))?;
        }

        let result = sqlx::query(
            r#"
            UPDATE spare_parts SET
                part_name = COALESCE($3, part_name),
                description = COALESCE($4, description),
                unit_price = COALESCE($5, unit_price)
            WHERE id = $1 AND ($2::uuid IS NULL OR supplier_id = $2)
            "#,
        )
        .bind(id)
        .bind(supplier_id)
        .bind(input.part_name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.unit_price)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Spare part".to_string()));
        }

        self.get(id, supplier_id).await
    }

    /// Add `delta` to a part's stock under a row lock.
    ///
    /// The result may not go below zero. Landing at or below the low-stock
    /// threshold alerts every administrator in the same transaction.
    pub async fn adjust_stock(&self, id: Uuid, input: AdjustStockInput) -> AppResult<StockLevel> {
        let mut tx = self.db.begin().await?;

        let current = sqlx::query_scalar::<_, i32>(
            "SELECT current_stock FROM spare_parts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Spare part".to_string()))?;

        validate_stock_adjustment(current, input.delta)
            .map_err(|m| AppError::InsufficientStock(m.to_string()))?;

        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE spare_parts SET current_stock = current_stock + $1
            WHERE id = $2
            RETURNING id, part_name, current_stock
            "#,
        )
        .bind(input.delta)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if is_low_stock(level.current_stock) {
            notify_low_stock(&mut *tx, level.id, &level.part_name, level.current_stock).await?;
        }

        tx.commit().await?;

        tracing::info!(
            part_id = %id,
            delta = input.delta,
            reason = input.reason.as_deref().unwrap_or(""),
            current_stock = level.current_stock,
            "stock adjusted"
        );

        Ok(level)
    }
}
