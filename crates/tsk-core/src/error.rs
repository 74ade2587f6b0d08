//! # Error Types
//!
//! Domain-specific error types for tsk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tsk-core errors (this file)                                           │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tsk-db errors (separate crate)                                        │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Console errors (in app)                                               │
//! │  └── AppError         - Code + message shown to the operator           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → AppError → Console      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item, bill, invoice)
//! 3. Errors are enum variants, never String
//! 4. Nothing is rejected after a state change: validation runs first

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Catalog item cannot be found.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Item is deactivated and cannot be billed.
    #[error("Item {0} is inactive")]
    ItemInactive(String),

    /// Requested quantity exceeds stock on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Add line (qty: 15)
    ///      │
    ///      ▼
    /// Check stock: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Cotton Saree", available: 10, requested: 15 }
    ///      │
    ///      ▼
    /// Console shows: "Only 10 Cotton Saree in stock"
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// Bill not found.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Line not found on the given bill.
    #[error("Line {line_id} not found on bill {bill_id}")]
    LineNotFound { bill_id: String, line_id: String },

    /// Staff member not found.
    #[error("Staff not found: {0}")]
    StaffNotFound(String),

    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Staff member is deactivated and cannot open bills.
    #[error("Staff {0} is inactive")]
    StaffInactive(String),

    /// Bill is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Adding lines to a finalized bill
    /// - Finalizing a bill twice
    /// - Cancelling a draft (drafts are discarded instead)
    #[error("Bill {bill_id} is {current_status}, cannot {operation}")]
    InvalidBillStatus {
        bill_id: String,
        current_status: String,
        operation: String,
    },

    /// Finalize attempted on a bill with no lines.
    #[error("Bill {0} has no lines")]
    EmptyBill(String),

    /// Bill has reached the line limit.
    #[error("Bill cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Invoice number kept colliding after the allowed retries.
    #[error("Invoice number {invoice_number} already exists after {attempts} attempts")]
    DuplicateInvoiceNumber { invoice_number: String, attempts: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidBillStatus`].
    pub fn invalid_status(
        bill_id: impl Into<String>,
        current_status: impl ToString,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidBillStatus {
            bill_id: bill_id.into(),
            current_status: current_status.to_string(),
            operation: operation.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any state changes, so a rejected call leaves the
/// bill and the stock untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "Cotton Saree".to_string(),
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cotton Saree: available 10, requested 15"
        );

        let err = CoreError::invalid_status("b-1", "FINALIZED", "add lines");
        assert_eq!(err.to_string(), "Bill b-1 is FINALIZED, cannot add lines");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "discount_percentage".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "discount_percentage must be between 0 and 100"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
