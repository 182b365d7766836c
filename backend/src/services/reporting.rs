//! Purchase, stock and supplier reports with CSV export

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::ReportPeriod;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Purchase total for one period
#[derive(Debug, Serialize)]
pub struct PurchaseTotals {
    pub total_purchases: Decimal,
    pub period: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StockRow {
    pub part_id: Uuid,
    pub part_name: String,
    pub current_stock: i32,
}

#[derive(Debug, Serialize)]
pub struct StockReport {
    pub stock: Vec<StockRow>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SupplierOrderCount {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub order_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SupplierSummary {
    pub suppliers: Vec<SupplierOrderCount>,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Sum of order totals placed within the period containing `base`,
    /// whatever their current status
    pub async fn purchases(&self, period: ReportPeriod, base: NaiveDate) -> AppResult<PurchaseTotals> {
        let (start, end) = period.bounds(base);

        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            r#"
            SELECT SUM(total_amount)
            FROM purchase_orders
            WHERE order_date::date BETWEEN $1 AND $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        Ok(PurchaseTotals {
            total_purchases: total.unwrap_or(Decimal::ZERO),
            period: period.label(base),
        })
    }

    pub async fn stock_levels(&self) -> AppResult<StockReport> {
        let stock = sqlx::query_as::<_, StockRow>(
            "SELECT id AS part_id, part_name, current_stock FROM spare_parts ORDER BY part_name, id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(StockReport { stock })
    }

    pub async fn supplier_summary(&self) -> AppResult<SupplierSummary> {
        let suppliers = sqlx::query_as::<_, SupplierOrderCount>(
            r#"
            SELECT s.id AS supplier_id, s.supplier_name, COUNT(po.id) AS order_count
            FROM suppliers s
            LEFT JOIN purchase_orders po ON po.supplier_id = s.id
            GROUP BY s.id, s.supplier_name
            ORDER BY s.supplier_name, s.id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(SupplierSummary { suppliers })
    }

    /// Export report rows as CSV with a header line
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;

        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_csv_has_header_and_rows() {
        let id = Uuid::nil();
        let rows = vec![StockRow {
            part_id: id,
            part_name: "Brake pad, front".to_string(),
            current_stock: 4,
        }];

        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("part_id,part_name,current_stock"));
        assert_eq!(
            lines.next(),
            Some(format!("{},\"Brake pad, front\",4", id).as_str())
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_export_is_empty() {
        let rows: Vec<StockRow> = Vec::new();
        assert_eq!(ReportingService::export_to_csv(&rows).unwrap(), "");
    }
}
