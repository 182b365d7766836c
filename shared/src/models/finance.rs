//! Supplier payments and purchase invoices

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    Card,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "CHEQUE" => Ok(PaymentMethod::Cheque),
            "CARD" => Ok(PaymentMethod::Card),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(ParseEnumError::new("payment method", other)),
        }
    }
}

/// Invoice settlement state; new invoices start Unpaid
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(InvoiceStatus::Unpaid),
            "Paid" => Ok(InvoiceStatus::Paid),
            "Cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(ParseEnumError::new("invoice status", other)),
        }
    }
}
