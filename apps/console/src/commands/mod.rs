//! # Console Commands
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (dispatch, lookups, output)
//! ├── item.rs     ◄─── Catalog CRUD, search and categories
//! ├── staff.rs    ◄─── Staff accounts and customers
//! ├── bill.rs     ◄─── Draft → finalize → cancel, bill printout
//! ├── stock.rs    ◄─── Stock counts and movement history
//! ├── report.rs   ◄─── Sales / GST / staff / payment reports
//! └── settings.rs ◄─── Settings, backups and status
//! ```
//!
//! Each handler takes the shared [`Context`], calls one `tsk-db` operation
//! and prints the result: a table for people, or JSON with `--json`.

mod bill;
mod item;
mod report;
mod settings;
mod staff;
mod stock;

use serde::Serialize;

use tsk_core::{Bill, Customer, Item, Staff};
use tsk_db::Database;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::error::AppError;

pub type CommandResult = Result<(), AppError>;

/// Everything a command handler needs.
pub struct Context {
    pub db: Database,
    pub config: AppConfig,
    pub json: bool,
}

impl Context {
    /// Prints `value` as JSON, or the human rendering otherwise.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> CommandResult {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }

    /// Item by id, then by barcode.
    pub async fn item(&self, key: &str) -> Result<Item, AppError> {
        if let Some(item) = self.db.items().get_by_id(key).await? {
            return Ok(item);
        }
        self.db
            .items()
            .get_by_barcode(key)
            .await?
            .ok_or_else(|| AppError::not_found("Item", key))
    }

    /// Staff by id, then by name.
    pub async fn staff(&self, key: &str) -> Result<Staff, AppError> {
        if let Some(staff) = self.db.staff().get_by_id(key).await? {
            return Ok(staff);
        }
        self.db
            .staff()
            .get_by_name(key)
            .await?
            .ok_or_else(|| AppError::not_found("Staff", key))
    }

    /// Customer by id, then by phone.
    pub async fn customer(&self, key: &str) -> Result<Customer, AppError> {
        if let Some(customer) = self.db.customers().get_by_id(key).await? {
            return Ok(customer);
        }
        self.db
            .customers()
            .get_by_phone(key)
            .await?
            .ok_or_else(|| AppError::not_found("Customer", key))
    }

    /// Bill by id, then by invoice number.
    pub async fn bill(&self, key: &str) -> Result<Bill, AppError> {
        if let Some(bill) = self.db.bills().get_by_id(key).await? {
            return Ok(bill);
        }
        self.db
            .bills()
            .get_by_invoice(key)
            .await?
            .ok_or_else(|| AppError::not_found("Bill", key))
    }
}

pub async fn dispatch(ctx: &Context, command: Command) -> CommandResult {
    match command {
        Command::Item(cmd) => item::run(ctx, cmd).await,
        Command::Category(cmd) => item::categories(ctx, cmd).await,
        Command::Staff(cmd) => staff::run(ctx, cmd).await,
        Command::Customer(cmd) => staff::customers(ctx, cmd).await,
        Command::Bill(cmd) => bill::run(ctx, cmd).await,
        Command::Stock(cmd) => stock::run(ctx, cmd).await,
        Command::Report(cmd) => report::run(ctx, cmd).await,
        Command::Settings(cmd) => settings::run(ctx, cmd).await,
        Command::Backup(args) => settings::backup(ctx, args).await,
        Command::Status => settings::status(ctx).await,
    }
}

/// Pads or truncates `text` to exactly `width` characters.
pub(crate) fn cell(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}
