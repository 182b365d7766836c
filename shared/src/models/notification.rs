//! Notification types and the low-stock rule

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::types::ParseEnumError;

/// Stock at or below this level alerts every administrator
pub const LOW_STOCK_THRESHOLD: i32 = 5;

pub fn is_low_stock(current_stock: i32) -> bool {
    current_stock <= LOW_STOCK_THRESHOLD
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    LowStock,
    OrderApproved,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::LowStock => "LOW_STOCK",
            NotificationType::OrderApproved => "ORDER_APPROVED",
        }
    }
}

impl FromStr for NotificationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW_STOCK" => Ok(NotificationType::LowStock),
            "ORDER_APPROVED" => Ok(NotificationType::OrderApproved),
            other => Err(ParseEnumError::new("notification type", other)),
        }
    }
}

pub fn low_stock_message(part_name: &str, part_id: Uuid, current_stock: i32) -> String {
    format!("Low stock alert: {part_name} (ID: {part_id}) is at {current_stock} units!")
}

pub fn order_approved_message(po_reference_number: &str) -> String {
    format!("Your purchase order {po_reference_number} has been approved.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(is_low_stock(5));
        assert!(is_low_stock(0));
        assert!(!is_low_stock(6));
    }

    #[test]
    fn test_messages() {
        let id = Uuid::nil();
        assert_eq!(
            low_stock_message("Brake pad", id, 4),
            format!("Low stock alert: Brake pad (ID: {id}) is at 4 units!")
        );
        assert_eq!(
            order_approved_message("PO-0042"),
            "Your purchase order PO-0042 has been approved."
        );
    }
}
