//! # Validation Module
//!
//! Input validation for TSK Billing.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console (clap)                                               │
//! │  ├── Type parsing (integers, Money, Percent)                           │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core (Rust)                                                  │
//! │  └── THIS MODULE: quantity, price, discount, GST slab rules            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_quantity >= 0)                                       │
//! │  ├── UNIQUE (invoice_number), UNIQUE (barcode)                         │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validator rejects; none of them clamps a bad value into range.
//!
//! ## Usage
//! ```rust
//! use tsk_core::money::Percent;
//! use tsk_core::validation::{validate_discount, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_discount(Percent::from_whole(120)).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{Money, Percent};
use crate::{
    MAX_BILL_LINES, MAX_DISCOUNT_BPS, MAX_GST_BPS, MAX_LINE_QUANTITY, MAX_STOCK_QUANTITY,
    MAX_UNIT_PRICE_PAISE,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required("name", name, 200).map(|_| ())
}

/// Validates a staff name (1 to 100 characters).
pub fn validate_staff_name(name: &str) -> ValidationResult<()> {
    required("staff name", name, 100).map(|_| ())
}

/// Validates a customer name (1 to 100 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required("customer name", name, 100).map(|_| ())
}

/// Validates a category name (1 to 50 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    required("category", name, 50).map(|_| ())
}

/// Validates a mobile number: exactly 10 digits.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = required("phone", phone, 10)?;

    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 10 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a barcode.
///
/// ## Rules
/// - 4 to 32 characters
/// - Letters, digits and hyphens only (EAN-13 and in-house codes)
///
/// ## Example
/// ```rust
/// use tsk_core::validation::validate_barcode;
///
/// assert!(validate_barcode("8901234500017").is_ok());
/// assert!(validate_barcode("TSK-SAR-01").is_ok());
/// assert!(validate_barcode("ab").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = required("barcode", barcode, 32)?;

    if barcode.len() < 4 {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must be at least 4 characters".to_string(),
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates an HSN code: 4, 6 or 8 digits.
pub fn validate_hsn_code(hsn: &str) -> ValidationResult<()> {
    let hsn = required("hsn_code", hsn, 8)?;

    if !matches!(hsn.len(), 4 | 6 | 8) || !hsn.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "hsn_code".to_string(),
            reason: "must be 4, 6 or 8 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an invoice prefix (1 to 10 ASCII letters or digits).
pub fn validate_invoice_prefix(prefix: &str) -> ValidationResult<()> {
    let prefix = required("invoice_prefix", prefix, 10)?;

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "invoice_prefix".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty is allowed (lists everything); at most 100 characters.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Bill: Add Line                                                         │
/// │                                                                         │
/// │  Operator enters quantity: 2                                           │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(2) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → stock check → line added                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free samples).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: "unit_price".to_string(),
        });
    }

    if price > Money::from_paise(MAX_UNIT_PRICE_PAISE) {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_PAISE / 100,
        });
    }

    Ok(())
}

/// Validates a discount percentage: 0% to 100% inclusive.
pub fn validate_discount(discount: Percent) -> ValidationResult<()> {
    validate_percent_range("discount_percentage", discount, MAX_DISCOUNT_BPS)
}

/// Validates a bill-level discount percentage: 0% to 100% inclusive.
pub fn validate_bill_discount(discount: Percent) -> ValidationResult<()> {
    validate_percent_range("bill_discount_percentage", discount, MAX_DISCOUNT_BPS)
}

/// Validates a GST rate: 0% to 28% inclusive.
///
/// ## Example
/// ```rust
/// use tsk_core::money::Percent;
/// use tsk_core::validation::validate_gst_rate;
///
/// assert!(validate_gst_rate(Percent::from_whole(5)).is_ok());
/// assert!(validate_gst_rate(Percent::from_whole(28)).is_ok());
/// assert!(validate_gst_rate(Percent::from_whole(30)).is_err());
/// assert!(validate_gst_rate(Percent::from_bps(-1)).is_err());
/// ```
pub fn validate_gst_rate(rate: Percent) -> ValidationResult<()> {
    validate_percent_range("gst_percentage", rate, MAX_GST_BPS)
}

fn validate_percent_range(field: &str, value: Percent, max_bps: i64) -> ValidationResult<()> {
    if value.bps() < 0 || value.bps() > max_bps {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: max_bps / 100,
        });
    }

    Ok(())
}

/// Validates an absolute stock level (counts may be zero, never negative).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "stock_quantity".to_string(),
        });
    }

    if qty > MAX_STOCK_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the line count before another line is added.
pub fn validate_line_count(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_BILL_LINES {
        return Err(ValidationError::OutOfRange {
            field: "bill lines".to_string(),
            min: 0,
            max: MAX_BILL_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use tsk_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_names() {
        assert!(validate_item_name("Cotton Saree").is_ok());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(201)).is_err());

        assert!(validate_staff_name("Ravi").is_ok());
        assert!(validate_staff_name("").is_err());
    }

    #[test]
    fn test_validate_customer_fields() {
        assert!(validate_customer_name("Meena Textiles").is_ok());
        assert!(validate_customer_name("  ").is_err());
        assert!(validate_category_name("Silk Sarees").is_ok());
        assert!(validate_category_name(&"x".repeat(51)).is_err());

        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("98765-4321").is_err());
    }

    #[test]
    fn test_validate_barcode_and_hsn() {
        assert!(validate_barcode("8901234500017").is_ok());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(33)).is_err());

        assert!(validate_hsn_code("5007").is_ok());
        assert!(validate_hsn_code("520811").is_ok());
        assert!(validate_hsn_code("50071").is_err());
        assert!(validate_hsn_code("50A7").is_err());
    }

    #[test]
    fn test_validate_invoice_prefix() {
        assert!(validate_invoice_prefix("TSK").is_ok());
        assert!(validate_invoice_prefix("INV24").is_ok());
        assert!(validate_invoice_prefix("TS-K").is_err());
        assert!(validate_invoice_prefix("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(i64::MAX),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_rupees(1000)).is_ok());
        assert!(validate_unit_price(Money::from_paise(-1)).is_err());
        assert!(validate_unit_price(Money::from_paise(MAX_UNIT_PRICE_PAISE)).is_ok());
        assert!(matches!(
            validate_unit_price(Money::from_paise(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_discount_bounds() {
        assert!(validate_discount(Percent::zero()).is_ok());
        assert!(validate_discount(Percent::from_whole(100)).is_ok());
        assert!(validate_discount(Percent::from_bps(10_001)).is_err());
        assert!(validate_discount(Percent::from_bps(-1)).is_err());
        assert!(validate_bill_discount(Percent::from_whole(101)).is_err());
    }

    #[test]
    fn test_validate_gst_rate() {
        for slab in [0, 5, 12, 18, 28] {
            assert!(validate_gst_rate(Percent::from_whole(slab)).is_ok());
        }
        assert!(validate_gst_rate(Percent::from_bps(2_801)).is_err());
        assert!(validate_gst_rate(Percent::from_whole(-5)).is_err());
    }

    #[test]
    fn test_validate_stock_and_lines() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
        assert!(validate_stock_quantity(MAX_STOCK_QUANTITY + 1).is_err());
        assert!(validate_line_count(0).is_ok());
        assert!(validate_line_count(MAX_BILL_LINES).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
