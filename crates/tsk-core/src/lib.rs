//! # tsk-core: Pure Billing Logic for TSK Billing
//!
//! This crate is the **heart** of TSK Billing. It holds the GST engine, the
//! bill state machine and invoice numbering as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        TSK Billing Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Console Front End                            │   │
//! │  │    item add ──► bill new ──► bill add ──► bill finalize         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tsk-db services                                   │   │
//! │  │    BillingService, InventoryLedger, InvoiceSequencer            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tsk-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐           │   │
//! │  │   │  money  │  │   gst   │  │  bill   │  │ invoice │           │   │
//! │  │   │ Money   │  │ TaxSplit│  │  Bill   │  │ TSK0001 │           │   │
//! │  │   │ Percent │  │ LineCalc│  │ Totals  │  │ fallback│           │   │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └─────────┘           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact `Money` and basis-point `Percent`
//! - [`gst`] - CGST/SGST/IGST split and per-line calculation
//! - [`bill`] - Bill aggregate: lines, totals, status transitions
//! - [`invoice`] - Invoice number formatting, parsing and fallback
//! - [`types`] - Catalog items, staff, stock movements, enums
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: database, network and file system access stay in `tsk-db`
//! 3. **Exact Money**: decimal arithmetic, rounded once at the bill level
//! 4. **Explicit Errors**: invalid input is rejected, never clamped
//!
//! ## Example Usage
//!
//! ```rust
//! use tsk_core::gst::compute_line;
//! use tsk_core::money::{Money, Percent};
//!
//! let line = compute_line(
//!     2,
//!     Money::from_rupees(1000),
//!     Percent::from_whole(10),
//!     Percent::from_whole(5),
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(line.taxable_amount, Money::from_rupees(1800));
//! assert_eq!(line.line_total, Money::from_rupees(1890));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill;
pub mod error;
pub mod gst;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill::{Bill, BillLine, BillTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use gst::{LineCalc, TaxSplit};
pub use money::{Money, Percent};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Invoice prefix used when the `invoice_prefix` setting is absent.
pub const DEFAULT_INVOICE_PREFIX: &str = "TSK";

/// Width of the zero-padded numeric invoice suffix (`TSK000001`).
pub const INVOICE_DIGITS: usize = 6;

/// Highest GST slab, in basis points (28%).
pub const MAX_GST_BPS: i64 = 2_800;

/// Upper bound for any discount percentage, in basis points (100%).
pub const MAX_DISCOUNT_BPS: i64 = 10_000;

/// Largest quantity on one line.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Highest unit price, in paise (₹1,00,00,000).
///
/// Together with `MAX_LINE_QUANTITY` and `MAX_BILL_LINES` this keeps every
/// bill amount, in paise, well inside `i64`.
pub const MAX_UNIT_PRICE_PAISE: i64 = 1_000_000_000;

/// Highest stock level an item may hold.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000_000;

/// Attempts made to insert a draft before giving up on invoice collisions.
pub const MAX_INVOICE_ATTEMPTS: u32 = 5;

/// Low stock threshold used when the setting is absent.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Maximum lines on one bill.
///
/// ## Business Reason
/// Prevents runaway drafts at the counter (a held key adding the same scan).
pub const MAX_BILL_LINES: usize = 200;
