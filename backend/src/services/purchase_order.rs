//! Purchase order ledger and fulfillment
//!
//! Status changes happen inside a transaction that holds the order row lock.
//! Delivery additionally locks every referenced part in ascending id order
//! before incrementing stock, so concurrent deliveries touching the same
//! parts serialize instead of deadlocking.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    aggregate_quantities, check_delivery, is_low_stock, order_total, validate_line_items,
    validate_po_reference, validate_stock_adjustment, LineItem, OrderTransition, PurchaseOrderStatus,
};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::notification::{notify_low_stock, notify_order_approved};
use crate::services::supplier::resolve_supplier_user;

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_reference_number: String,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub order_date: DateTime<Utc>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub status: PurchaseOrderStatus,
    pub approved_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_by_user_id: Option<Uuid>,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    pub spare_part_id: Uuid,
    pub part_name: String,
    pub quantity: i32,
    pub agreed_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    po_reference_number: String,
    supplier_id: Uuid,
    supplier_name: String,
    order_date: DateTime<Utc>,
    expected_delivery_date: Option<NaiveDate>,
    total_amount: Decimal,
    status: String,
    approved_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_by_user_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    order_id: Uuid,
    spare_part_id: Uuid,
    part_name: String,
    quantity: i32,
    agreed_price: Decimal,
}

impl From<ItemRow> for PurchaseOrderItem {
    fn from(row: ItemRow) -> Self {
        let line = LineItem {
            spare_part_id: row.spare_part_id,
            quantity: row.quantity,
            agreed_price: row.agreed_price,
        };
        PurchaseOrderItem {
            id: row.id,
            spare_part_id: row.spare_part_id,
            part_name: row.part_name,
            quantity: row.quantity,
            agreed_price: row.agreed_price,
            line_total: line.line_total(),
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<PurchaseOrderItem>) -> AppResult<PurchaseOrder> {
        Ok(PurchaseOrder {
            id: self.id,
            po_reference_number: self.po_reference_number,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            order_date: self.order_date,
            expected_delivery_date: self.expected_delivery_date,
            total_amount: self.total_amount,
            status: self.status.parse()?,
            approved_at: self.approved_at,
            delivered_at: self.delivered_at,
            created_by_user_id: self.created_by_user_id,
            items,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub po_reference_number: String,
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub items: Vec<LineItem>,
}

/// Stock movement caused by a delivery
#[derive(Debug, Clone, Serialize)]
pub struct StockUpdate {
    pub part_id: Uuid,
    pub part_name: String,
    pub quantity_added: i32,
    pub current_stock: i32,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub order_id: Uuid,
    pub delivered_at: DateTime<Utc>,
    pub stock_updates: Vec<StockUpdate>,
    pub low_stock_notifications: u64,
}

#[derive(Debug, FromRow)]
struct LockedOrder {
    po_reference_number: String,
    supplier_id: Uuid,
    status: String,
    delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct UpdatedPart {
    id: Uuid,
    part_name: String,
    current_stock: i32,
}

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.po_reference_number, o.supplier_id, s.supplier_name, o.order_date,
           o.expected_delivery_date, o.total_amount, o.status, o.approved_at,
           o.delivered_at, o.created_by_user_id
    FROM purchase_orders o
    JOIN suppliers s ON s.id = o.supplier_id
"#;

/// Lock an order row for the rest of the transaction
async fn lock_order(conn: &mut PgConnection, id: Uuid) -> AppResult<LockedOrder> {
    sqlx::query_as::<_, LockedOrder>(
        r#"
        SELECT po_reference_number, supplier_id, status, delivered_at
        FROM purchase_orders
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))
}

impl PurchaseOrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a Pending order; the total is computed from its lines
    pub async fn create(
        &self,
        input: CreateOrderInput,
        created_by: Uuid,
    ) -> AppResult<PurchaseOrder> {
        validate_po_reference(&input.po_reference_number)
            .map_err(|m| AppError::invalid("po_reference_number", m))?;
        validate_line_items(&input.items).map_err(|m| AppError::invalid("items", m))?;

        let total = order_total(&input.items);
        let part_ids: Vec<Uuid> = input
            .items
            .iter()
            .map(|i| i.spare_part_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tx = self.db.begin().await?;

        let supplier_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM suppliers WHERE id = $1)")
                .bind(input.supplier_id)
                .fetch_one(&mut *tx)
                .await?;
        if !supplier_exists {
            return Err(AppError::NotFound("Supplier".to_string()));
        }

        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM spare_parts WHERE id = ANY($1)",
        )
        .bind(&part_ids)
        .fetch_one(&mut *tx)
        .await?;
        if found != part_ids.len() as i64 {
            return Err(AppError::NotFound("Spare part".to_string()));
        }

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_orders
                (po_reference_number, supplier_id, expected_delivery_date, total_amount, created_by_user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(input.po_reference_number.trim())
        .bind(input.supplier_id)
        .bind(input.expected_delivery_date)
        .bind(total)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::unique_violation(e, "po_reference_number"))?;

        for (position, item) in input.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (order_id, part_id, quantity, agreed_price, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id)
            .bind(item.spare_part_id)
            .bind(item.quantity)
            .bind(item.agreed_price)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(%order_id, supplier_id = %input.supplier_id, %total, "purchase order created");

        self.get(order_id, None).await
    }

    /// Orders newest first, optionally limited to one supplier and one status
    pub async fn list(
        &self,
        supplier_id: Option<Uuid>,
        status: Option<PurchaseOrderStatus>,
    ) -> AppResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"{ORDER_SELECT}
            WHERE ($1::uuid IS NULL OR o.supplier_id = $1)
              AND ($2::text IS NULL OR o.status = $2)
            ORDER BY o.order_date DESC, o.id"#
        ))
        .bind(supplier_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_items(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect()
    }

    /// Fetch one order with its lines; with `supplier_id` set, other suppliers' orders are not found
    pub async fn get(&self, id: Uuid, supplier_id: Option<Uuid>) -> AppResult<PurchaseOrder> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE o.id = $1 AND ($2::uuid IS NULL OR o.supplier_id = $2)"
        ))
        .bind(id)
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        let mut items = self.load_items(&[id]).await?;
        row.into_order(items.remove(&id).unwrap_or_default())
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<PurchaseOrderItem>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT i.id, i.order_id, i.part_id AS spare_part_id, p.part_name, i.quantity, i.agreed_price
            FROM purchase_order_items i
            JOIN spare_parts p ON p.id = i.part_id
            WHERE i.order_id = ANY($1)
            ORDER BY i.order_id, i.position, i.id
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.db)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<PurchaseOrderItem>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    /// Pending -> Approved, stamping `approved_at` and notifying the supplier's user
    pub async fn approve(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut *tx, id).await?;
        let status: PurchaseOrderStatus = order.status.parse()?;
        let next = status.transition(OrderTransition::Approve)?;

        let approved_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE purchase_orders SET status = $2, approved_at = NOW()
            WHERE id = $1
            RETURNING approved_at
            "#,
        )
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await?;

        match resolve_supplier_user(&mut *tx, order.supplier_id).await? {
            Some(user_id) => {
                notify_order_approved(&mut *tx, user_id, &order.po_reference_number).await?;
            }
            None => {
                tracing::debug!(supplier_id = %order.supplier_id, "no user to notify of approval");
            }
        }

        tx.commit().await?;

        tracing::info!(order_id = %id, %approved_at, "purchase order approved");

        self.get(id, None).await
    }

    /// Pending -> Rejected
    pub async fn reject(&self, id: Uuid) -> AppResult<PurchaseOrder> {
        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut *tx, id).await?;
        let status: PurchaseOrderStatus = order.status.parse()?;
        let next = status.transition(OrderTransition::Reject)?;

        sqlx::query("UPDATE purchase_orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, "purchase order rejected");

        self.get(id, None).await
    }

    /// Approved -> Delivered, adding every line's quantity to stock.
    ///
    /// Runs as one transaction: the order row is locked first, then all parts
    /// in ascending id order. Stock is incremented in place and re-read; any
    /// part left at or below the low-stock threshold alerts every admin.
    pub async fn deliver(&self, id: Uuid) -> AppResult<DeliveryReport> {
        let mut tx = self.db.begin().await?;

        let order = lock_order(&mut *tx, id).await?;
        let status: PurchaseOrderStatus = order.status.parse()?;
        check_delivery(status, order.delivered_at)?;

        let delivered_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE purchase_orders SET status = $2, delivered_at = NOW()
            WHERE id = $1
            RETURNING delivered_at
            "#,
        )
        .bind(id)
        .bind(PurchaseOrderStatus::Delivered.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let lines = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT part_id, quantity FROM purchase_order_items WHERE order_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let totals = aggregate_quantities(lines);

        let mut stock_updates = Vec::with_capacity(totals.len());
        let mut low_stock_notifications = 0;

        if !totals.is_empty() {
            let part_ids: Vec<Uuid> = totals.keys().copied().collect();
            let locked: HashMap<Uuid, i32> = sqlx::query_as::<_, (Uuid, i32)>(
                "SELECT id, current_stock FROM spare_parts WHERE id = ANY($1) ORDER BY id FOR UPDATE",
            )
            .bind(&part_ids)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();

            for (part_id, quantity) in totals {
                let too_large = || {
                    AppError::ValidationError(format!("Delivered quantity for part {} is too large", part_id))
                };
                let quantity = i32::try_from(quantity).map_err(|_| too_large())?;
                let current = locked
                    .get(&part_id)
                    .copied()
                    .ok_or_else(|| AppError::NotFound("Spare part".to_string()))?;
                validate_stock_adjustment(current, quantity).map_err(|_| too_large())?;

                let part = sqlx::query_as::<_, UpdatedPart>(
                    r#"
                    UPDATE spare_parts SET current_stock = current_stock + $1
                    WHERE id = $2
                    RETURNING id, part_name, current_stock
                    "#,
                )
                .bind(quantity)
                .bind(part_id)
                .fetch_one(&mut *tx)
                .await?;

                let low_stock = is_low_stock(part.current_stock);
                if low_stock {
                    low_stock_notifications +=
                        notify_low_stock(&mut *tx, part.id, &part.part_name, part.current_stock).await?;
                }

                stock_updates.push(StockUpdate {
                    part_id: part.id,
                    part_name: part.part_name,
                    quantity_added: quantity,
                    current_stock: part.current_stock,
                    low_stock,
                });
            }
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %id,
            parts = stock_updates.len(),
            low_stock_notifications,
            "purchase order delivered"
        );

        Ok(DeliveryReport {
            order_id: id,
            delivered_at,
            stock_updates,
            low_stock_notifications,
        })
    }
}
