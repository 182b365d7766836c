//! Vendor performance scoring
//!
//! A supplier's composite score blends on-time delivery, completion rate,
//! approval speed and dispute rate. Inputs are the supplier's full order
//! history; every metric is rounded half-up to two decimal places only after
//! the composite has been computed from unrounded values.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::purchase_order::PurchaseOrderStatus;

/// The fields of a purchase order that feed the score
#[derive(Debug, Clone, PartialEq)]
pub struct OrderHistoryEntry {
    pub status: PurchaseOrderStatus,
    pub order_date: Option<DateTime<Utc>>,
    pub expected_delivery_date: Option<NaiveDate>,
    pub approved_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Stored metrics for one supplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorMetrics {
    pub score: Decimal,
    pub on_time_rate: Decimal,
    pub avg_approval_hours: Decimal,
    pub dispute_rate: Decimal,
    pub completion_rate: Decimal,
}

impl VendorMetrics {
    /// Metrics of a supplier with no order history
    pub fn zero() -> Self {
        Self {
            score: Decimal::ZERO,
            on_time_rate: Decimal::ZERO,
            avg_approval_hours: Decimal::ZERO,
            dispute_rate: Decimal::ZERO,
            completion_rate: Decimal::ZERO,
        }
    }
}

impl Default for VendorMetrics {
    fn default() -> Self {
        Self::zero()
    }
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round half-up (away from zero) to two decimal places
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp into the closed range [0, 100]
pub fn clamp_score(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(HUNDRED)
}

fn percentage(part: usize, whole: usize) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(part as u64) * HUNDRED / Decimal::from(whole as u64)
}

fn approval_hours(order: &OrderHistoryEntry) -> Option<Decimal> {
    let approved_at = order.approved_at?;
    let order_date = order.order_date?;
    let micros = (approved_at - order_date).num_microseconds()?;
    Some(Decimal::from(micros) / Decimal::from(3_600_000_000i64))
}

/// Compute a supplier's metrics from its order history
pub fn compute_vendor_metrics(orders: &[OrderHistoryEntry]) -> VendorMetrics {
    let total_orders = orders.len();

    let delivered: Vec<&OrderHistoryEntry> = orders
        .iter()
        .filter(|o| o.status == PurchaseOrderStatus::Delivered && o.delivered_at.is_some())
        .collect();
    let completion_rate = percentage(delivered.len(), total_orders);

    let mut on_time_total = 0;
    let mut on_time_count = 0;
    for order in &delivered {
        let (Some(delivered_at), Some(expected)) = (order.delivered_at, order.expected_delivery_date)
        else {
            continue;
        };
        on_time_total += 1;
        if delivered_at.date_naive() <= expected {
            on_time_count += 1;
        }
    }
    let on_time_rate = percentage(on_time_count, on_time_total);

    let latencies: Vec<Decimal> = orders.iter().filter_map(approval_hours).collect();
    let avg_approval_hours = if latencies.is_empty() {
        Decimal::ZERO
    } else {
        latencies.iter().copied().sum::<Decimal>() / Decimal::from(latencies.len() as u64)
    };

    // No dispute source exists yet; the weight is kept so the formula stays stable.
    let dispute_rate = Decimal::ZERO;

    let approval_score = clamp_score(HUNDRED - avg_approval_hours);
    let score = clamp_score(
        on_time_rate * Decimal::new(45, 2)
            + completion_rate * Decimal::new(35, 2)
            + approval_score * Decimal::new(20, 2)
            - dispute_rate * Decimal::new(10, 2),
    );

    VendorMetrics {
        score: round2(score),
        on_time_rate: round2(on_time_rate),
        avg_approval_hours: round2(avg_approval_hours),
        dispute_rate: round2(dispute_rate),
        completion_rate: round2(completion_rate),
    }
}
