//! Supplier payments and purchase invoices

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    validate_amount, validate_invoice_dates, validate_invoice_number, validate_payment_amount,
    InvoiceStatus, PaymentMethod,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct FinanceService {
    db: PgPool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplierPayment {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub order_id: Uuid,
    pub po_reference_number: String,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    supplier_id: Uuid,
    supplier_name: String,
    order_id: Uuid,
    po_reference_number: String,
    amount: Decimal,
    payment_date: NaiveDate,
    payment_method: String,
    reference_number: Option<String>,
    notes: Option<String>,
}

impl TryFrom<PaymentRow> for SupplierPayment {
    type Error = AppError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(SupplierPayment {
            id: row.id,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
            order_id: row.order_id,
            po_reference_number: row.po_reference_number,
            amount: row.amount,
            payment_date: row.payment_date,
            payment_method: row.payment_method.parse()?,
            reference_number: row.reference_number,
            notes: row.notes,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseInvoice {
    pub id: Uuid,
    pub order_id: Uuid,
    pub po_reference_number: String,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    order_id: Uuid,
    po_reference_number: String,
    invoice_number: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    total_amount: Decimal,
    status: String,
}

impl TryFrom<InvoiceRow> for PurchaseInvoice {
    type Error = AppError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(PurchaseInvoice {
            id: row.id,
            order_id: row.order_id,
            po_reference_number: row.po_reference_number,
            invoice_number: row.invoice_number,
            issue_date: row.issue_date,
            due_date: row.due_date,
            total_amount: row.total_amount,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentInput {
    pub supplier_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    /// Defaults to today
    pub payment_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 50, message = "Reference number must be at most 50 characters"))]
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceInput {
    pub order_id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub total_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInvoiceStatusInput {
    pub status: InvoiceStatus,
}

const PAYMENT_SELECT: &str = r#"
    SELECT sp.id, sp.supplier_id, s.supplier_name, sp.order_id, po.po_reference_number,
           sp.amount, sp.payment_date, sp.payment_method, sp.reference_number, sp.notes
    FROM supplier_payments sp
    JOIN suppliers s ON s.id = sp.supplier_id
    JOIN purchase_orders po ON po.id = sp.order_id
"#;

const INVOICE_SELECT: &str = r#"
    SELECT pi.id, pi.order_id, po.po_reference_number, pi.invoice_number, pi.issue_date,
           pi.due_date, pi.total_amount, pi.status
    FROM purchase_invoices pi
    JOIN purchase_orders po ON po.id = pi.order_id
"#;

impl FinanceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Payments
    // ========================================================================

    pub async fn list_payments(&self, supplier_id: Option<Uuid>) -> AppResult<Vec<SupplierPayment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "{PAYMENT_SELECT} WHERE ($1::uuid IS NULL OR sp.supplier_id = $1) ORDER BY sp.payment_date DESC, sp.id"
        ))
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(SupplierPayment::try_from).collect()
    }

    pub async fn get_payment(&self, id: Uuid) -> AppResult<SupplierPayment> {
        sqlx::query_as::<_, PaymentRow>(&format!("{PAYMENT_SELECT} WHERE sp.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment".to_string()))?
            .try_into()
    }

    /// Record a payment against one of the supplier's own orders
    pub async fn create_payment(&self, input: CreatePaymentInput) -> AppResult<SupplierPayment> {
        input.validate()?;
        validate_payment_amount(input.amount).map_err(|m| AppError::invalid("amount", m))?;

        let order_supplier = sqlx::query_scalar::<_, Uuid>(
            "SELECT supplier_id FROM purchase_orders WHERE id = $1",
        )
        .bind(input.order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase order".to_string()))?;

        if order_supplier != input.supplier_id {
            return Err(AppError::invalid(
                "order_id",
                "Purchase order does not belong to this supplier",
            ));
        }

        let payment_date = input
            .payment_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO supplier_payments
                (supplier_id, order_id, amount, payment_date, payment_method, reference_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.supplier_id)
        .bind(input.order_id)
        .bind(input.amount)
        .bind(payment_date)
        .bind(input.payment_method.as_str())
        .bind(&input.reference_number)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(payment_id = %id, order_id = %input.order_id, amount = %input.amount, "payment recorded");

        self.get_payment(id).await
    }

    // ========================================================================
    // Invoices
    // ========================================================================

    pub async fn list_invoices(&self, status: Option<InvoiceStatus>) -> AppResult<Vec<PurchaseInvoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{INVOICE_SELECT} WHERE ($1::text IS NULL OR pi.status = $1) ORDER BY pi.issue_date DESC, pi.invoice_number"
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(PurchaseInvoice::try_from).collect()
    }

    pub async fn get_invoice(&self, id: Uuid) -> AppResult<PurchaseInvoice> {
        sqlx::query_as::<_, InvoiceRow>(&format!("{INVOICE_SELECT} WHERE pi.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?
            .try_into()
    }

    pub async fn create_invoice(&self, input: CreateInvoiceInput) -> AppResult<PurchaseInvoice> {
        validate_invoice_number(&input.invoice_number)
            .map_err(|m| AppError::invalid("invoice_number", m))?;
        validate_invoice_dates(input.issue_date, input.due_date)
            .map_err(|m| AppError::invalid("due_date", m))?;
        validate_amount(input.total_amount).map_err(|m| AppError::invalid("total_amount", m))?;

        let order_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM purchase_orders WHERE id = $1)")
                .bind(input.order_id)
                .fetch_one(&self.db)
                .await?;
        if !order_exists {
            return Err(AppError::NotFound("Purchase order".to_string()));
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO purchase_invoices (order_id, invoice_number, issue_date, due_date, total_amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.order_id)
        .bind(input.invoice_number.trim())
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.total_amount)
        .bind(InvoiceStatus::default().as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::unique_violation(e, "invoice_number"))?;

        tracing::info!(invoice_id = %id, order_id = %input.order_id, "invoice created");

        self.get_invoice(id).await
    }

    pub async fn update_invoice_status(
        &self,
        id: Uuid,
        input: UpdateInvoiceStatusInput,
    ) -> AppResult<PurchaseInvoice> {
        let result = sqlx::query("UPDATE purchase_invoices SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(input.status.as_str())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invoice".to_string()));
        }

        self.get_invoice(id).await
    }
}
