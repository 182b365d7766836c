//! Field validation for VendorPulse inputs

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{order_total, LineItem};

// ============================================================================
// Account Validations
// ============================================================================

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Passwords need at least 8 characters
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err("Username is required");
    }
    if trimmed.chars().count() > 150 {
        return Err("Username must be at most 150 characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may contain only letters, digits and @/./+/-/_");
    }
    Ok(())
}

/// Phone numbers: up to 20 characters of digits, spaces, dashes and a leading +
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if phone.len() > 20 {
        return Err("Phone number must be at most 20 characters");
    }
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == ' ' || c == '-') {
        return Err("Invalid phone number format");
    }
    Ok(())
}

// ============================================================================
// Catalog and Order Validations
// ============================================================================

pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    if sku.trim().is_empty() {
        return Err("SKU code is required");
    }
    if sku.len() > 50 {
        return Err("SKU code must be at most 50 characters");
    }
    Ok(())
}

pub fn validate_po_reference(reference: &str) -> Result<(), &'static str> {
    if reference.trim().is_empty() {
        return Err("PO reference number is required");
    }
    if reference.len() > 20 {
        return Err("PO reference number must be at most 20 characters");
    }
    Ok(())
}

pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be a positive integer");
    }
    Ok(())
}

/// Integer digits of a NUMERIC(10, 2) price column
const PRICE_DIGITS: u32 = 8;
/// Integer digits of a NUMERIC(15, 2) amount column
const AMOUNT_DIGITS: u32 = 13;

fn has_cent_precision(value: Decimal) -> bool {
    value.round_dp(2) == value
}

fn fits_digits(value: Decimal, digits: u32) -> bool {
    value.abs() < Decimal::from(10u64.pow(digits))
}

/// Unit and agreed prices: non-negative, whole cents, below 100,000,000
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    if !has_cent_precision(price) {
        return Err("Price may have at most 2 decimal places");
    }
    if !fits_digits(price, PRICE_DIGITS) {
        return Err("Price must be below 100000000");
    }
    Ok(())
}

/// Invoice and payment amounts: non-negative, whole cents, below 10^13
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if !has_cent_precision(amount) {
        return Err("Amount may have at most 2 decimal places");
    }
    if !fits_digits(amount, AMOUNT_DIGITS) {
        return Err("Amount must be below 10000000000000");
    }
    Ok(())
}

/// An order needs at least one line, each with a positive quantity and a
/// valid price, and its total has to fit the order's amount column.
pub fn validate_line_items(items: &[LineItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("A purchase order needs at least one item");
    }
    for item in items {
        validate_quantity(item.quantity)?;
        validate_price(item.agreed_price)?;
    }
    if !fits_digits(order_total(items), AMOUNT_DIGITS) {
        return Err("Order total is too large");
    }
    Ok(())
}

/// Apply a stock delta, refusing results below zero
pub fn validate_stock_adjustment(current_stock: i32, delta: i32) -> Result<i32, &'static str> {
    match current_stock.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        Some(_) => Err("Stock cannot go below zero"),
        None => Err("Stock adjustment out of range"),
    }
}

// ============================================================================
// Finance Validations
// ============================================================================

pub fn validate_payment_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be greater than zero");
    }
    validate_amount(amount)
}

pub fn validate_invoice_dates(
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> Result<(), &'static str> {
    match due_date {
        Some(due) if due < issue_date => Err("Due date cannot be before the issue date"),
        _ => Ok(()),
    }
}

pub fn validate_invoice_number(number: &str) -> Result<(), &'static str> {
    if number.trim().is_empty() {
        return Err("Invoice number is required");
    }
    if number.len() > 50 {
        return Err("Invoice number must be at most 50 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // ========================================================================
    // Account Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ops@vendorpulse.io").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ops.manager").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+1 555-0100").is_ok());
        assert!(validate_phone("555 0100 ext 4").is_err());
        assert!(validate_phone("+").is_err());
        assert!(validate_phone("123456789012345678901").is_err());
    }

    // ========================================================================
    // Catalog and Order Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_sku_and_reference_lengths() {
        assert!(validate_sku("BRK-001").is_ok());
        assert!(validate_sku(&"X".repeat(51)).is_err());
        assert!(validate_po_reference("PO-2025-0001").is_ok());
        assert!(validate_po_reference(&"P".repeat(21)).is_err());
        assert!(validate_po_reference("").is_err());
    }

    #[test]
    fn test_validate_line_items() {
        let line = |quantity, cents| LineItem {
            spare_part_id: Uuid::new_v4(),
            quantity,
            agreed_price: Decimal::new(cents, 2),
        };
        assert!(validate_line_items(&[line(1, 0)]).is_ok());
        assert!(validate_line_items(&[]).is_err());
        assert!(validate_line_items(&[line(1, 100), line(0, 100)]).is_err());
        assert!(validate_line_items(&[line(2, -1)]).is_err());
    }

    #[test]
    fn test_price_is_limited_to_whole_cents() {
        assert!(validate_price("1.01".parse().unwrap()).is_ok());
        assert!(validate_price("1.010".parse().unwrap()).is_ok());
        assert!(validate_price("1.005".parse().unwrap()).is_err());
    }

    #[test]
    fn test_price_must_fit_its_column() {
        assert!(validate_price("99999999.99".parse().unwrap()).is_ok());
        assert!(validate_price(Decimal::from(100_000_000)).is_err());
    }

    #[test]
    fn test_order_total_must_fit_its_column() {
        let item = LineItem {
            spare_part_id: Uuid::new_v4(),
            quantity: i32::MAX,
            agreed_price: "99999999.99".parse().unwrap(),
        };
        assert!(validate_price(item.agreed_price).is_ok());
        assert_eq!(validate_line_items(&[item]), Err("Order total is too large"));
    }

    #[test]
    fn test_stock_adjustment() {
        assert_eq!(validate_stock_adjustment(10, -10), Ok(0));
        assert_eq!(validate_stock_adjustment(3, 4), Ok(7));
        assert!(validate_stock_adjustment(3, -4).is_err());
        assert!(validate_stock_adjustment(i32::MAX, 1).is_err());
    }

    // ========================================================================
    // Finance Validation Tests
    // ========================================================================

    #[test]
    fn test_invoice_dates() {
        let issue = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert!(validate_invoice_dates(issue, None).is_ok());
        assert!(validate_invoice_dates(issue, Some(issue)).is_ok());
        assert!(validate_invoice_dates(issue, issue.pred_opt()).is_err());
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        assert!(validate_payment_amount(Decimal::new(1, 2)).is_ok());
        assert!(validate_payment_amount(Decimal::ZERO).is_err());
        assert!(validate_payment_amount("10.001".parse().unwrap()).is_err());
        assert!(validate_payment_amount(Decimal::from(10_000_000_000_000u64)).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount("9999999999999.99".parse().unwrap()).is_ok());
        assert!(validate_amount(Decimal::new(-1, 2)).is_err());
    }
}
