//! Purchase order lifecycle and line items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::types::ParseEnumError;

/// Purchase order status
///
/// `Pending -> Approved -> Delivered` and `Pending -> Rejected`. Every
/// transition is one-way and nothing leaves Rejected, Delivered or Cancelled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    Cancelled,
}

/// Actions that move an order between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Approve,
    Reject,
    Deliver,
}

/// Rejected status change
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Only pending orders can be approved.")]
    NotPendingForApproval,

    #[error("Only pending orders can be rejected.")]
    NotPendingForRejection,

    #[error("Only approved orders can be marked as delivered.")]
    NotApproved,

    #[error("This purchase order was already delivered.")]
    AlreadyDelivered,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseOrderStatus::Pending => "Pending",
            PurchaseOrderStatus::Approved => "Approved",
            PurchaseOrderStatus::Rejected => "Rejected",
            PurchaseOrderStatus::Delivered => "Delivered",
            PurchaseOrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses with no outgoing transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseOrderStatus::Rejected
                | PurchaseOrderStatus::Delivered
                | PurchaseOrderStatus::Cancelled
        )
    }

    /// Apply a transition, returning the resulting status
    pub fn transition(self, action: OrderTransition) -> Result<Self, TransitionError> {
        use PurchaseOrderStatus::*;

        match (self, action) {
            (Pending, OrderTransition::Approve) => Ok(Approved),
            (Pending, OrderTransition::Reject) => Ok(Rejected),
            (Approved, OrderTransition::Deliver) => Ok(Delivered),
            (Delivered, OrderTransition::Deliver) => Err(TransitionError::AlreadyDelivered),
            (_, OrderTransition::Approve) => Err(TransitionError::NotPendingForApproval),
            (_, OrderTransition::Reject) => Err(TransitionError::NotPendingForRejection),
            (_, OrderTransition::Deliver) => Err(TransitionError::NotApproved),
        }
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PurchaseOrderStatus::Pending),
            "Approved" => Ok(PurchaseOrderStatus::Approved),
            "Rejected" => Ok(PurchaseOrderStatus::Rejected),
            "Delivered" => Ok(PurchaseOrderStatus::Delivered),
            "Cancelled" => Ok(PurchaseOrderStatus::Cancelled),
            other => Err(ParseEnumError::new("purchase order status", other)),
        }
    }
}

/// Check that an order may be delivered.
///
/// A set `delivered_at` counts as delivered even when the status disagrees.
pub fn check_delivery(
    status: PurchaseOrderStatus,
    delivered_at: Option<DateTime<Utc>>,
) -> Result<(), TransitionError> {
    if delivered_at.is_some() {
        return Err(TransitionError::AlreadyDelivered);
    }
    status.transition(OrderTransition::Deliver).map(|_| ())
}

/// A single order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub spare_part_id: Uuid,
    pub quantity: i32,
    pub agreed_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.agreed_price
    }
}

/// Order total: sum of quantity x agreed price over all lines
pub fn order_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Sum quantities per part.
///
/// The map iterates in ascending part id, which is also the row-lock order.
pub fn aggregate_quantities<I>(lines: I) -> BTreeMap<Uuid, i64>
where
    I: IntoIterator<Item = (Uuid, i32)>,
{
    let mut totals = BTreeMap::new();
    for (part_id, quantity) in lines {
        *totals.entry(part_id).or_insert(0i64) += i64::from(quantity);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALL: [PurchaseOrderStatus; 5] = [
        PurchaseOrderStatus::Pending,
        PurchaseOrderStatus::Approved,
        PurchaseOrderStatus::Rejected,
        PurchaseOrderStatus::Delivered,
        PurchaseOrderStatus::Cancelled,
    ];

    #[test]
    fn test_happy_path() {
        let approved = PurchaseOrderStatus::Pending
            .transition(OrderTransition::Approve)
            .unwrap();
        assert_eq!(approved, PurchaseOrderStatus::Approved);
        assert_eq!(
            approved.transition(OrderTransition::Deliver).unwrap(),
            PurchaseOrderStatus::Delivered
        );
    }

    #[test]
    fn test_terminal_statuses_have_no_exit() {
        for status in ALL.iter().filter(|s| s.is_terminal()) {
            for action in [
                OrderTransition::Approve,
                OrderTransition::Reject,
                OrderTransition::Deliver,
            ] {
                assert!(status.transition(action).is_err());
            }
        }
    }

    #[test]
    fn test_approving_rejected_order_fails() {
        assert_eq!(
            PurchaseOrderStatus::Rejected.transition(OrderTransition::Approve),
            Err(TransitionError::NotPendingForApproval)
        );
    }

    #[test]
    fn test_pending_cannot_be_delivered() {
        assert_eq!(
            check_delivery(PurchaseOrderStatus::Pending, None),
            Err(TransitionError::NotApproved)
        );
    }

    #[test]
    fn test_delivered_at_blocks_delivery_even_if_approved() {
        let stamp = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(
            check_delivery(PurchaseOrderStatus::Approved, Some(stamp)),
            Err(TransitionError::AlreadyDelivered)
        );
        assert_eq!(
            check_delivery(PurchaseOrderStatus::Delivered, None),
            Err(TransitionError::AlreadyDelivered)
        );
        assert!(check_delivery(PurchaseOrderStatus::Approved, None).is_ok());
    }

    #[test]
    fn test_status_parses_storage_form() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<PurchaseOrderStatus>().unwrap(), status);
        }
        assert!("pending".parse::<PurchaseOrderStatus>().is_err());
    }

    #[test]
    fn test_duplicate_parts_are_summed() {
        let part = Uuid::new_v4();
        let other = Uuid::new_v4();
        let totals = aggregate_quantities(vec![(part, 3), (other, 1), (part, 2)]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&part], 5);
        assert_eq!(totals[&other], 1);
    }

    #[test]
    fn test_aggregate_is_ordered_by_part_id() {
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let totals = aggregate_quantities(ids.iter().map(|id| (*id, 1)));
        ids.sort();
        assert_eq!(totals.keys().copied().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_order_total() {
        let items = vec![
            LineItem {
                spare_part_id: Uuid::new_v4(),
                quantity: 3,
                agreed_price: Decimal::new(1250, 2),
            },
            LineItem {
                spare_part_id: Uuid::new_v4(),
                quantity: 2,
                agreed_price: Decimal::new(400, 2),
            },
        ];
        assert_eq!(order_total(&items), Decimal::new(4550, 2));
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
