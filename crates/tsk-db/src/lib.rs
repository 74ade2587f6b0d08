//! # tsk-db: Database Layer for TSK Billing
//!
//! SQLite storage and every transactional billing operation, built on
//! sqlx. Business rules come from `tsk-core`; this crate decides what runs
//! inside which transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TSK Billing Data Flow                            │
//! │                                                                         │
//! │  Console command (tsk bill finalize ...)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tsk-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │   Services    │   │ Repositories  │   │   Database    │    │   │
//! │  │   │               │   │               │   │   (pool.rs)   │    │   │
//! │  │   │ BillingService│──►│ bill, item    │──►│ SqlitePool    │    │   │
//! │  │   │ InventoryLedgr│   │ stock, staff  │   │ migrations    │    │   │
//! │  │   │ InvoiceSeq.   │   │ customer,     │   │ backups       │    │   │
//! │  │   │               │   │ category,     │   │               │    │   │
//! │  │   │               │   │ settings,     │   │               │    │   │
//! │  │   │               │   │ report        │   │               │    │   │
//! │  │   └───────────────┘   └───────────────┘   └───────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (tsk.db)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration and backups
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Row access (items, categories, staff, customers, bills,
//!   movements, reports)
//! - [`ledger`] - Stock changes paired with movements
//! - [`sequencer`] - Invoice numbering with fallback
//! - [`billing`] - Draft, finalize and cancel flows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tsk_db::{Database, DbConfig};
//! use tsk_core::{Percent, PaymentMode};
//!
//! let db = Database::new(DbConfig::new("tsk.db")).await?;
//!
//! let draft = db.billing().create_draft(&staff_id, None).await?;
//! db.billing().add_line(&draft.id, &item_id, 2, Percent::from_whole(10)).await?;
//! db.billing().recompute_totals(&draft.id, Percent::zero(), false).await?;
//! let bill = db.billing().finalize(&draft.id, PaymentMode::Upi).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sequencer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{BackupRecord, Database, DbConfig};

pub use billing::BillingService;
pub use ledger::{InventoryLedger, Reconciliation};
pub use sequencer::InvoiceSequencer;

// Repository re-exports for convenience
pub use repository::bill::BillRepository;
pub use repository::category::CategoryRepository;
pub use repository::customer::{CustomerRepository, WALK_IN_CUSTOMER_ID};
pub use repository::item::{ItemRepository, ItemUpdate, NewItem};
pub use repository::report::{
    BillSummary, DateRange, GstSummary, LowStockItem, PaymentBreakdown, ReportRepository,
    SalesSummary, StaffPerformance,
};
pub use repository::settings::SettingsRepository;
pub use repository::staff::StaffRepository;
