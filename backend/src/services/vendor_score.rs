//! Vendor score persistence and recalculation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{compute_vendor_metrics, OrderHistoryEntry, VendorMetrics};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Clone)]
pub struct VendorScoreService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VendorScore {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub score: Decimal,
    pub on_time_rate: Decimal,
    pub avg_approval_hours: Decimal,
    pub dispute_rate: Decimal,
    pub completion_rate: Decimal,
    pub last_calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VendorScoreSummary {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub score: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recalculation {
    pub updated: usize,
    pub vendors: Vec<VendorScoreSummary>,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    supplier_id: Uuid,
    status: String,
    order_date: Option<DateTime<Utc>>,
    expected_delivery_date: Option<NaiveDate>,
    approved_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl VendorScoreService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<VendorScore>> {
        let scores = sqlx::query_as::<_, VendorScore>(
            r#"
            SELECT vs.id, vs.supplier_id, s.supplier_name, vs.score, vs.on_time_rate,
                   vs.avg_approval_hours, vs.dispute_rate, vs.completion_rate,
                   vs.last_calculated_at
            FROM vendor_scores vs
            JOIN suppliers s ON s.id = vs.supplier_id
            ORDER BY vs.score DESC, s.supplier_name
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(scores)
    }

    /// Recompute every supplier's metrics from its full order history.
    ///
    /// All suppliers are written in one transaction; a failure leaves the
    /// previous scores untouched.
    #[instrument(skip(self))]
    pub async fn recalculate_all(&self) -> AppResult<Recalculation> {
        let mut tx = self.db.begin().await?;

        let suppliers = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, supplier_name FROM suppliers ORDER BY id",
        )
        .fetch_all(&mut *tx)
        .await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT supplier_id, status, order_date, expected_delivery_date, approved_at, delivered_at
            FROM purchase_orders
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut history: HashMap<Uuid, Vec<OrderHistoryEntry>> = HashMap::new();
        for row in rows {
            history
                .entry(row.supplier_id)
                .or_default()
                .push(OrderHistoryEntry {
                    status: row.status.parse()?,
                    order_date: row.order_date,
                    expected_delivery_date: row.expected_delivery_date,
                    approved_at: row.approved_at,
                    delivered_at: row.delivered_at,
                });
        }

        let mut vendors = Vec::with_capacity(suppliers.len());
        for (supplier_id, supplier_name) in suppliers {
            let orders = history.remove(&supplier_id).unwrap_or_default();
            let metrics = compute_vendor_metrics(&orders);
            upsert_score(&mut tx, supplier_id, &metrics).await?;

            vendors.push(VendorScoreSummary {
                supplier_id,
                supplier_name,
                score: metrics.score,
            });
        }

        tx.commit().await?;

        tracing::info!(updated = vendors.len(), "vendor scores recalculated");

        Ok(Recalculation {
            updated: vendors.len(),
            vendors,
        })
    }
}

/// Overwrite (or create) a supplier's stored metrics
async fn upsert_score(
    conn: &mut sqlx::PgConnection,
    supplier_id: Uuid,
    metrics: &VendorMetrics,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO vendor_scores
            (supplier_id, score, on_time_rate, avg_approval_hours, dispute_rate, completion_rate, last_calculated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW())
        ON CONFLICT (supplier_id) DO UPDATE SET
            score = EXCLUDED.score,
            on_time_rate = EXCLUDED.on_time_rate,
            avg_approval_hours = EXCLUDED.avg_approval_hours,
            dispute_rate = EXCLUDED.dispute_rate,
            completion_rate = EXCLUDED.completion_rate,
            last_calculated_at = EXCLUDED.last_calculated_at
        "#,
    )
    .bind(supplier_id)
    .bind(metrics.score)
    .bind(metrics.on_time_rate)
    .bind(metrics.avg_approval_hours)
    .bind(metrics.dispute_rate)
    .bind(metrics.completion_rate)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
