//! # Repository Module
//!
//! Database repository implementations for TSK Billing.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Pool-backed repositories (one statement, own connection)           │
//! │                                                                         │
//! │     db.items().search("silk", 20)                                      │
//! │     db.reports().sales_summary(range)                                  │
//! │                                                                         │
//! │  2. Connection functions (join the caller's transaction)               │
//! │                                                                         │
//! │     let mut tx = pool.begin().await?;                                  │
//! │     item::fetch_item(&mut tx, id)         ← get_item                   │
//! │     item::fetch_stock / store_stock       ← get_stock / set_stock      │
//! │     stock::append_movement(&mut tx, ..)   ← append_stock_movement      │
//! │     bill::insert_bill / update_bill_totals                             │
//! │     bill::insert_bill_item / delete_bill_items                         │
//! │     bill::max_invoice_suffix(&mut tx, "TSK")                           │
//! │     settings::fetch_setting(&mut tx, "invoice_prefix")                 │
//! │     tx.commit().await?;                                                │
//! │                                                                         │
//! │  Repositories delegate to the connection functions, so SQL lives in    │
//! │  exactly one place per statement.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are decoded into `FromRow` records and converted into `tsk-core`
//! types at this boundary; a row that fails the domain rules surfaces as
//! `DbError::CorruptRow` instead of leaking bad values upward.
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Catalog CRUD and search
//! - [`StaffRepository`](staff::StaffRepository) - Staff accounts
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers named on bills
//! - [`CategoryRepository`](category::CategoryRepository) - Catalog categories
//! - [`SettingsRepository`](settings::SettingsRepository) - Key/value settings
//! - [`BillRepository`](bill::BillRepository) - Read access to bills
//! - [`ReportRepository`](report::ReportRepository) - Sales and GST reports

pub mod bill;
pub mod category;
pub mod customer;
pub mod item;
pub mod report;
pub mod settings;
pub mod staff;
pub mod stock;

use tsk_core::{Money, Percent};

/// Decodes a paise column.
pub(crate) fn money(paise: i64) -> Money {
    Money::from_paise(paise)
}

/// Decodes a basis-point column.
pub(crate) fn percent(bps: i64) -> Percent {
    Percent::from_bps(bps)
}

/// Decodes a `SUM(..)` of paise that SQLite may hand back as NULL.
pub(crate) fn money_sum(paise: Option<i64>) -> Money {
    Money::from_paise(paise.unwrap_or(0))
}
