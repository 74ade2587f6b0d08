//! # Command Line
//!
//! ```text
//! tsk [--config tsk.toml] [--json] <COMMAND>
//!
//!   item      add | list | search | show | update | deactivate | delete
//!   category  add | list
//!   staff     add | list | deactivate
//!   customer  add | list
//!   bill      new | add | update | remove | totals | finalize | cancel |
//!             discard | show | list
//!   stock     set | history | check
//!   report    sales | gst | payments | staff | bills | low-stock
//!   settings  get | set | list
//!   backup    [PATH] | history
//!   status
//! ```
//!
//! Items are addressed by id or barcode, bills by id or invoice number,
//! staff by id or name, customers by id or phone.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tsk_core::{BillStatus, Money, PaymentMode, Percent};

#[derive(Debug, Parser)]
#[command(name = "tsk", version, about = "GST billing for the TSK textile counter")]
pub struct Cli {
    /// Config file (default: tsk.toml in the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Catalog items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Catalog categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Counter staff
    #[command(subcommand)]
    Staff(StaffCommand),

    /// Customers named on bills
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Bills: draft, lines, finalize, cancel
    #[command(subcommand)]
    Bill(BillCommand),

    /// Stock corrections and movement history
    #[command(subcommand)]
    Stock(StockCommand),

    /// Sales, staff, payment and GST reports
    #[command(subcommand)]
    Report(ReportCommand),

    /// Shared business settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Copy the database
    Backup(BackupArgs),

    /// Database health, migrations and the next invoice number
    Status,
}

// =============================================================================
// Items
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Add a catalog item with its opening stock
    Add {
        name: String,
        /// Selling price in rupees, e.g. 1499.50
        #[arg(long)]
        price: Money,
        /// GST rate, e.g. 5 or 12%
        #[arg(long)]
        gst: Percent,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        hsn: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Staff recorded on the opening stock movement
        #[arg(long)]
        staff: Option<String>,
    },

    List {
        /// Include deactivated items
        #[arg(long)]
        all: bool,
    },

    /// Search by name, barcode or category
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    Show { item: String },

    /// Change catalog details; unspecified fields are kept
    Update {
        item: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<Money>,
        #[arg(long)]
        gst: Option<Percent>,
        #[arg(long)]
        barcode: Option<String>,
        #[arg(long)]
        hsn: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },

    Deactivate { item: String },

    /// Permanently delete; past bills keep the item's name and price
    Delete { item: String },
}

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    Add { name: String },
    /// Categories with their active item counts
    List,
}

// =============================================================================
// Staff / Customers
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    Add { name: String },
    List {
        #[arg(long)]
        all: bool,
    },
    Deactivate { staff: String },
}

#[derive(Debug, Subcommand)]
pub enum CustomerCommand {
    Add {
        name: String,
        /// 10-digit mobile number
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List customers, optionally matching a name or phone
    List {
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

// =============================================================================
// Bills
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum BillCommand {
    /// Open a draft bill
    New {
        #[arg(long)]
        staff: String,
        /// Customer id or phone (default: walk-in)
        #[arg(long)]
        customer: Option<String>,
    },

    /// Add an item to a draft
    Add {
        bill: String,
        item: String,
        #[arg(long, default_value_t = 1)]
        qty: i64,
        /// Line discount, e.g. 10 or 12.5%
        #[arg(long, default_value = "0")]
        discount: Percent,
    },

    /// Change a line's quantity and discount
    Update {
        bill: String,
        line: String,
        #[arg(long)]
        qty: i64,
        /// New line discount (default: keep the line's discount)
        #[arg(long)]
        discount: Option<Percent>,
    },

    Remove { bill: String, line: String },

    /// Recompute totals with a bill discount
    Totals {
        bill: String,
        /// Bill discount (default: the bill's current discount)
        #[arg(long)]
        discount: Option<Percent>,
        /// IGST instead of CGST + SGST (default: the bill's current setting)
        #[arg(long)]
        interstate: Option<bool>,
    },

    /// Take payment and deduct stock
    Finalize {
        bill: String,
        #[arg(long)]
        payment: PaymentMode,
    },

    /// Cancel a finalized bill and return its stock
    Cancel { bill: String },

    /// Delete a draft
    Discard { bill: String },

    Show { bill: String },

    List {
        #[arg(long, value_enum, default_value_t = StatusArg::Finalized)]
        status: StatusArg,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    Finalized,
    Cancelled,
}

impl From<StatusArg> for BillStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Draft => BillStatus::Draft,
            StatusArg::Finalized => BillStatus::Finalized,
            StatusArg::Cancelled => BillStatus::Cancelled,
        }
    }
}

// =============================================================================
// Stock
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum StockCommand {
    /// Set stock after a physical count
    Set {
        item: String,
        quantity: i64,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        staff: Option<String>,
    },

    History {
        item: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },

    /// Compare stock with the sum of its movements
    Check { item: String },
}

// =============================================================================
// Reports
// =============================================================================

/// Inclusive local date range; both default to today.
#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    Sales(RangeArgs),
    Gst(RangeArgs),
    Payments(RangeArgs),
    Staff(RangeArgs),
    Bills {
        #[command(flatten)]
        range: RangeArgs,
        #[arg(long)]
        staff: Option<String>,
    },
    /// Active items at or below the threshold
    LowStock {
        /// Default: the low_stock_threshold setting
        #[arg(long)]
        threshold: Option<i64>,
    },
}

// =============================================================================
// Settings / Backup
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Get { key: String },
    Set { key: String, value: String },
    List,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Target file (default: a timestamped file in the backup directory)
    pub path: Option<PathBuf>,

    /// List recent backups instead
    #[arg(long, conflicts_with = "path")]
    pub history: bool,
}
