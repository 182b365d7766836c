//! Purchase order fulfillment against a live database
//!
//! Each test gets a fresh migrated database from `sqlx::test`, so these cover
//! the SQL of approval, delivery and score recalculation rather than the pure
//! helpers they are built on.

use rust_decimal::Decimal;
use shared::LineItem;
use sqlx::PgPool;
use uuid::Uuid;
use vendorpulse_backend::{
    services::{
        purchase_order::{CreateOrderInput, PurchaseOrder},
        PurchaseOrderService, VendorScoreService,
    },
    AppError,
};

async fn insert_user(pool: &PgPool, username: &str, role: &str) -> Uuid {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, 'x') RETURNING id",
    )
    .bind(username)
    .bind(format!("{}@vendorpulse.test", username))
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO user_profiles (user_id, role) VALUES ($1, $2)")
        .bind(id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();

    id
}

async fn insert_supplier(pool: &PgPool, name: &str, user_id: Option<Uuid>) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO suppliers (supplier_name, user_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn insert_part(pool: &PgPool, supplier_id: Uuid, sku: &str, stock: i32) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO spare_parts (part_name, sku_code, unit_price, current_stock, supplier_id)
        VALUES ($1, $1, 10, $2, $3)
        RETURNING id
        "#,
    )
    .bind(sku)
    .bind(stock)
    .bind(supplier_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn stock_of(pool: &PgPool, part_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT current_stock FROM spare_parts WHERE id = $1")
        .bind(part_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn stored_status(pool: &PgPool, order_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status FROM purchase_orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn line(part_id: Uuid, quantity: i32, price: &str) -> LineItem {
    LineItem {
        spare_part_id: part_id,
        quantity,
        agreed_price: price.parse().unwrap(),
    }
}

async fn place_order(
    service: &PurchaseOrderService,
    reference: &str,
    supplier_id: Uuid,
    items: Vec<LineItem>,
    created_by: Uuid,
) -> Result<PurchaseOrder, AppError> {
    service
        .create(
            CreateOrderInput {
                po_reference_number: reference.to_string(),
                supplier_id,
                expected_delivery_date: None,
                items,
            },
            created_by,
        )
        .await
}

// ============================================================================
// Order Creation
// ============================================================================

#[cfg(test)]
mod creation_tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_stored_total_matches_stored_lines(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-1", supplier, vec![line(part, 3, "1.01")], admin)
            .await
            .unwrap();

        let line_sum: Decimal = order.items.iter().map(|i| i.line_total).sum();
        assert_eq!(order.total_amount, "3.03".parse::<Decimal>().unwrap());
        assert_eq!(order.total_amount, line_sum);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_fractional_cent_price_is_rejected(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let result =
            place_order(&service, "PO-1", supplier, vec![line(part, 3, "1.005")], admin).await;

        assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "items"));
        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_orders")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orders, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_oversized_price_is_a_validation_error(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let result =
            place_order(&service, "PO-1", supplier, vec![line(part, 1, "100000000")], admin).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}

// ============================================================================
// Approval and Delivery
// ============================================================================

#[cfg(test)]
mod fulfillment_tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delivery_adds_summed_quantities_and_alerts_each_admin(pool: PgPool) {
        let first_admin = insert_user(&pool, "admin1", "ADMIN").await;
        insert_user(&pool, "admin2", "ADMIN").await;
        insert_user(&pool, "ops", "OPS").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let stocked = insert_part(&pool, supplier, "BRK-1", 10).await;
        let scarce = insert_part(&pool, supplier, "BRK-2", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(
            &service,
            "PO-1",
            supplier,
            vec![line(stocked, 3, "5.00"), line(scarce, 4, "2.50"), line(stocked, 2, "5.00")],
            first_admin,
        )
        .await
        .unwrap();
        service.approve(order.id).await.unwrap();
        let report = service.deliver(order.id).await.unwrap();

        assert_eq!(stock_of(&pool, stocked).await, 15);
        assert_eq!(stock_of(&pool, scarce).await, 4);
        assert_eq!(report.stock_updates.len(), 2);
        assert_eq!(report.low_stock_notifications, 2);

        let (rows, admins): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(DISTINCT n.user_id)
            FROM notifications n
            JOIN user_profiles p ON p.user_id = n.user_id
            WHERE n.notification_type = 'LOW_STOCK' AND p.role = 'ADMIN'
            "#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!((rows, admins), (2, 2));

        let ops_alerts: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications n JOIN users u ON u.id = n.user_id WHERE u.username = 'ops'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(ops_alerts, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_second_delivery_fails_and_leaves_stock(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 20).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-1", supplier, vec![line(part, 7, "1.00")], admin)
            .await
            .unwrap();
        service.approve(order.id).await.unwrap();
        service.deliver(order.id).await.unwrap();

        let again = service.deliver(order.id).await;
        assert!(matches!(again, Err(AppError::InvalidTransition(_))));
        assert_eq!(stock_of(&pool, part).await, 27);
        assert_eq!(stored_status(&pool, order.id).await, "Delivered");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_deliveries_apply_once(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 20).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-1", supplier, vec![line(part, 6, "1.00")], admin)
            .await
            .unwrap();
        service.approve(order.id).await.unwrap();

        let (first, second) = tokio::join!(service.deliver(order.id), service.deliver(order.id));

        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(stock_of(&pool, part).await, 26);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delivery_past_stock_range_rolls_back(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", i32::MAX - 1).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-1", supplier, vec![line(part, 5, "1.00")], admin)
            .await
            .unwrap();
        service.approve(order.id).await.unwrap();

        let result = service.deliver(order.id).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert_eq!(stock_of(&pool, part).await, i32::MAX - 1);
        assert_eq!(stored_status(&pool, order.id).await, "Approved");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_approving_rejected_order_changes_nothing(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier = insert_supplier(&pool, "Acme", None).await;
        let part = insert_part(&pool, supplier, "BRK-1", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-1", supplier, vec![line(part, 1, "1.00")], admin)
            .await
            .unwrap();
        service.reject(order.id).await.unwrap();

        let result = service.approve(order.id).await;
        assert!(matches!(result, Err(AppError::InvalidTransition(_))));

        let (status, approved_at): (String, Option<chrono::DateTime<chrono::Utc>>) =
            sqlx::query_as("SELECT status, approved_at FROM purchase_orders WHERE id = $1")
                .bind(order.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(status, "Rejected");
        assert!(approved_at.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_approval_notifies_linked_supplier_user(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let supplier_user = insert_user(&pool, "acme", "SUPPLIER").await;
        let supplier = insert_supplier(&pool, "Acme", Some(supplier_user)).await;
        let part = insert_part(&pool, supplier, "BRK-1", 0).await;
        let service = PurchaseOrderService::new(pool.clone());

        let order = place_order(&service, "PO-7", supplier, vec![line(part, 1, "1.00")], admin)
            .await
            .unwrap();
        let approved = service.approve(order.id).await.unwrap();
        assert!(approved.approved_at.is_some());

        let notified: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM notifications WHERE notification_type = 'ORDER_APPROVED'",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(notified, vec![supplier_user]);
    }
}

// ============================================================================
// Vendor Score Recalculation
// ============================================================================

#[cfg(test)]
mod recalculation_tests {
    use super::*;

    type StoredScore = (Uuid, Decimal, Decimal, Decimal, Decimal, Decimal);

    async fn stored_scores(pool: &PgPool) -> Vec<StoredScore> {
        sqlx::query_as(
            r#"
            SELECT supplier_id, score, on_time_rate, avg_approval_hours, dispute_rate, completion_rate
            FROM vendor_scores
            ORDER BY supplier_id
            "#,
        )
        .fetch_all(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_recalculation_is_stable_over_unchanged_history(pool: PgPool) {
        let admin = insert_user(&pool, "admin", "ADMIN").await;
        let busy = insert_supplier(&pool, "Acme", None).await;
        let idle = insert_supplier(&pool, "Idle", None).await;
        let part = insert_part(&pool, busy, "BRK-1", 50).await;
        let orders = PurchaseOrderService::new(pool.clone());

        let delivered = place_order(&orders, "PO-1", busy, vec![line(part, 2, "1.00")], admin)
            .await
            .unwrap();
        orders.approve(delivered.id).await.unwrap();
        orders.deliver(delivered.id).await.unwrap();
        let rejected = place_order(&orders, "PO-2", busy, vec![line(part, 1, "1.00")], admin)
            .await
            .unwrap();
        orders.reject(rejected.id).await.unwrap();

        let scores = VendorScoreService::new(pool.clone());
        let first_run = scores.recalculate_all().await.unwrap();
        let first = stored_scores(&pool).await;
        let second_run = scores.recalculate_all().await.unwrap();
        let second = stored_scores(&pool).await;

        assert_eq!(first_run.updated, 2);
        assert_eq!(second_run.updated, 2);
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);

        let busy_row = first.iter().find(|row| row.0 == busy).unwrap();
        assert_eq!(busy_row.5, "50.00".parse::<Decimal>().unwrap());
        let idle_row = first.iter().find(|row| row.0 == idle).unwrap();
        assert_eq!(idle_row.1, Decimal::ZERO);
    }
}
