//! # Console Error Type
//!
//! One error type for every subcommand.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  tsk bill finalize TSK000008 --payment upi                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::bill::finalize() -> Result<(), AppError>                    │
//! │         │                                                               │
//! │         ├── DbError::ConnectionFailed ──────────► DATABASE_ERROR (3)   │
//! │         ├── CoreError::InsufficientStock ───────► INSUFFICIENT_STOCK(4)│
//! │         ├── CoreError::Validation ──────────────► VALIDATION_ERROR (2) │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: error: [INSUFFICIENT_STOCK] Only 7 of Cotton Dhoti in stock   │
//! │  exit code 4                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--json` the error is printed as `{"code": "...", "message": "..."}`.

use serde::Serialize;
use tsk_core::CoreError;
use tsk_db::DbError;

use crate::config::ConfigError;

/// Error returned by console commands.
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    /// Operation not allowed in the bill's current state
    BusinessLogic,
    DuplicateInvoice,
    DatabaseError,
    ConfigError,
    Internal,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::DuplicateInvoice => "DUPLICATE_INVOICE",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Process exit code for this error.
    pub const fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::ValidationError | ErrorCode::ConfigError => 2,
            ErrorCode::DatabaseError | ErrorCode::Internal => 3,
            ErrorCode::InsufficientStock => 4,
            ErrorCode::NotFound => 5,
            ErrorCode::BusinessLogic | ErrorCode::DuplicateInvoice => 6,
        }
    }
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => AppError::from(core),
            DbError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => AppError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                AppError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                AppError::new(ErrorCode::ValidationError, format!("Rejected by database: {}", message))
            }
            DbError::CorruptRow { entity, id, reason } => {
                tracing::error!(entity = %entity, id = %id, reason = %reason, "Corrupt row");
                AppError::new(
                    ErrorCode::DatabaseError,
                    format!("Stored {} {} is corrupt: {}", entity, id, reason),
                )
            }
            DbError::ConnectionFailed(e) => {
                AppError::new(ErrorCode::DatabaseError, format!("Database connection failed: {}", e))
            }
            DbError::MigrationFailed(e) => {
                AppError::new(ErrorCode::DatabaseError, format!("Database migration failed: {}", e))
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                AppError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AppError::new(ErrorCode::DatabaseError, e)
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => AppError::not_found("Item", &id),
            CoreError::BillNotFound(id) => AppError::not_found("Bill", &id),
            CoreError::StaffNotFound(id) => AppError::not_found("Staff", &id),
            CoreError::CustomerNotFound(id) => AppError::not_found("Customer", &id),
            CoreError::LineNotFound { bill_id, line_id } => {
                AppError::not_found("Line", &format!("{} on bill {}", line_id, bill_id))
            }
            CoreError::InsufficientStock {
                item,
                available,
                requested,
            } => AppError::new(
                ErrorCode::InsufficientStock,
                format!("Only {} of {} in stock, {} requested", available, item, requested),
            ),
            CoreError::DuplicateInvoiceNumber { .. } => {
                AppError::new(ErrorCode::DuplicateInvoice, err.to_string())
            }
            CoreError::Validation(e) => AppError::validation(e.to_string()),
            CoreError::ItemInactive(_)
            | CoreError::StaffInactive(_)
            | CoreError::InvalidBillStatus { .. }
            | CoreError::EmptyBill(_)
            | CoreError::TooManyLines { .. } => AppError::new(ErrorCode::BusinessLogic, err.to_string()),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::internal(format!("JSON output failed: {}", err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tsk_core::ValidationError;

    #[test]
    fn test_domain_errors_keep_their_code() {
        let err = AppError::from(DbError::Domain(CoreError::InsufficientStock {
            item: "Cotton Dhoti".to_string(),
            available: 7,
            requested: 10,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 7 of Cotton Dhoti in stock, 10 requested");
        assert_eq!(err.code.exit_code(), 4);
    }

    #[test]
    fn test_status_errors_are_business_logic() {
        let err = AppError::from(CoreError::invalid_status("b1", "FINALIZED", "finalize"));
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(err.to_string().starts_with("[BUSINESS_LOGIC]"));
    }

    #[test]
    fn test_validation_and_duplicates() {
        let err = AppError::from(DbError::from(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = AppError::from(DbError::duplicate("items.barcode", "SAR-001"));
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_serializes_for_scripts() {
        let json = serde_json::to_string(&AppError::not_found("Bill", "TSK000099")).unwrap();
        assert_eq!(json, r#"{"code":"NOT_FOUND","message":"Bill not found: TSK000099"}"#);
    }
}
