//! # Bill Commands
//!
//! ## Counter Flow
//! ```text
//! tsk bill new --staff Lakshmi              → TSK000008 (DRAFT)
//! tsk bill add TSK000008 SAR-001 --qty 2 --discount 10
//! tsk bill add TSK000008 DHT-003
//! tsk bill totals TSK000008 --discount 5    → recomputed, printed
//! tsk bill finalize TSK000008 --payment upi → stock deducted, printed
//! ```
//!
//! Lines are addressed by their position on the printout (`1`, `2`, ...)
//! or by line id.

use tracing::info;

use tsk_core::{Bill, BillStatus, Percent};

use super::{cell, CommandResult, Context};
use crate::cli::BillCommand;
use crate::error::AppError;

const WALK_IN_LABEL: &str = "Walk-in Customer";

pub async fn run(ctx: &Context, cmd: BillCommand) -> CommandResult {
    let billing = ctx.db.billing();

    match cmd {
        BillCommand::New { staff, customer } => {
            let staff = ctx.staff(&staff).await?;
            let customer_id = match customer {
                Some(key) => Some(ctx.customer(&key).await?.id),
                None => None,
            };
            let mut draft = billing.create_draft(&staff.id, customer_id.as_deref()).await?;
            if ctx.config.is_interstate {
                billing.recompute_totals(&draft.id, Percent::zero(), true).await?;
                draft = billing.get_bill(&draft.id).await?;
            }
            show(ctx, &draft).await
        }
        BillCommand::Add {
            bill,
            item,
            qty,
            discount,
        } => {
            let bill = ctx.bill(&bill).await?;
            let item = ctx.item(&item).await?;
            let updated = billing.add_line(&bill.id, &item.id, qty, discount).await?;
            show(ctx, &updated).await
        }
        BillCommand::Update {
            bill,
            line,
            qty,
            discount,
        } => {
            let bill = ctx.bill(&bill).await?;
            let line_id = resolve_line(&bill, &line)?;
            let discount = match discount {
                Some(discount) => discount,
                None => bill.line(&line_id)?.discount,
            };
            let updated = billing.update_line(&bill.id, &line_id, qty, discount).await?;
            show(ctx, &updated).await
        }
        BillCommand::Remove { bill, line } => {
            let bill = ctx.bill(&bill).await?;
            let line_id = resolve_line(&bill, &line)?;
            let updated = billing.remove_line(&bill.id, &line_id).await?;
            show(ctx, &updated).await
        }
        BillCommand::Totals {
            bill,
            discount,
            interstate,
        } => {
            let bill = ctx.bill(&bill).await?;
            let discount = discount.unwrap_or(bill.bill_discount);
            let interstate = interstate.unwrap_or(bill.is_interstate);
            billing.recompute_totals(&bill.id, discount, interstate).await?;
            show(ctx, &billing.get_bill(&bill.id).await?).await
        }
        BillCommand::Finalize { bill, payment } => {
            let bill = ctx.bill(&bill).await?;
            let finalized = billing.finalize(&bill.id, payment).await?;
            show(ctx, &finalized).await
        }
        BillCommand::Cancel { bill } => {
            let bill = ctx.bill(&bill).await?;
            let cancelled = billing.cancel(&bill.id).await?;
            show(ctx, &cancelled).await
        }
        BillCommand::Discard { bill } => {
            let bill = ctx.bill(&bill).await?;
            billing.discard_draft(&bill.id).await?;
            info!(invoice_number = %bill.invoice_number, "Draft discarded from console");
            ctx.emit(&bill.id, || format!("Discarded draft {}", bill.invoice_number))
        }
        BillCommand::Show { bill } => {
            let bill = ctx.bill(&bill).await?;
            show(ctx, &bill).await
        }
        BillCommand::List { status, limit } => {
            let bills = ctx.db.bills().list_by_status(status.into(), limit).await?;
            ctx.emit(&bills, || list(&bills))
        }
    }
}

async fn show(ctx: &Context, bill: &Bill) -> CommandResult {
    let staff_name = ctx
        .db
        .staff()
        .get_by_id(&bill.staff_id)
        .await?
        .map(|staff| staff.name)
        .unwrap_or_else(|| bill.staff_id.clone());

    let customer_name = match &bill.customer_id {
        Some(id) => ctx.db.customers().get_by_id(id).await?.map(|c| c.name),
        None => None,
    };

    ctx.emit(bill, || {
        render(bill, &ctx.config.store_name, &staff_name, customer_name.as_deref())
    })
}

/// Line id from a 1-based position or an id.
fn resolve_line(bill: &Bill, key: &str) -> Result<String, AppError> {
    if let Ok(position) = key.parse::<usize>() {
        return position
            .checked_sub(1)
            .and_then(|index| bill.lines.get(index))
            .map(|line| line.id.clone())
            .ok_or_else(|| AppError::not_found("Line", key));
    }
    bill.line(key).map(|line| line.id.clone()).map_err(AppError::from)
}

/// Plain-text bill for the counter screen.
pub fn render(bill: &Bill, store_name: &str, staff_name: &str, customer_name: Option<&str>) -> String {
    let totals = &bill.totals;
    let rule = "-".repeat(78);
    let mut out = String::new();

    out.push_str(&format!("{}\n", store_name));
    out.push_str(&format!(
        "Invoice {}   {}   Staff: {}\n",
        bill.invoice_number, bill.status, staff_name
    ));
    out.push_str(&format!("Customer: {}\n", customer_name.unwrap_or(WALK_IN_LABEL)));
    if let Some(at) = bill.finalized_at {
        let mode = bill.payment_mode.map(|m| m.as_str()).unwrap_or("-");
        out.push_str(&format!("Finalized {}   Paid by {}\n", at.format("%Y-%m-%d %H:%M"), mode));
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!(
        "{:>2} {} {:>4} {:>10} {:>7} {:>11} {:>6} {:>11}\n",
        "#", cell("ITEM", 20), "QTY", "RATE", "DISC", "TAXABLE", "GST", "AMOUNT"
    ));

    for (index, line) in bill.lines.iter().enumerate() {
        out.push_str(&format!(
            "{:>2} {} {:>4} {:>10} {:>7} {:>11} {:>6} {:>11}\n",
            index + 1,
            cell(&line.item_name, 20),
            line.quantity,
            line.unit_price.to_string(),
            line.discount.to_string(),
            line.calc.taxable_amount.to_string(),
            line.gst_rate.to_string(),
            line.calc.line_total.to_string()
        ));
    }

    out.push_str(&rule);
    out.push('\n');

    let mut row = |label: &str, value: String| {
        out.push_str(&format!("{:>60} {:>17}\n", label, value));
    };
    row("Subtotal", totals.subtotal.to_string());
    if bill.bill_discount.is_positive() {
        row(&format!("Bill discount {}", bill.bill_discount), (-totals.discount_amount).to_string());
    }
    if bill.is_interstate {
        row("IGST", totals.igst.to_string());
    } else {
        row("CGST", totals.cgst.to_string());
        row("SGST", totals.sgst.to_string());
    }
    row("Round off", totals.round_off.to_string());
    row("GRAND TOTAL", totals.grand_total.to_string());

    if bill.status == BillStatus::Draft {
        out.push_str("Draft: run `tsk bill totals` after editing lines.");
    } else {
        out.truncate(out.trim_end().len());
    }
    out
}

fn list(bills: &[Bill]) -> String {
    let mut out = format!(
        "{} {} {} {:>12}",
        cell("INVOICE", 18),
        cell("STATUS", 10),
        cell("CREATED", 16),
        "TOTAL"
    );
    for bill in bills {
        out.push_str(&format!(
            "\n{} {} {} {:>12}",
            cell(&bill.invoice_number, 18),
            cell(bill.status.as_str(), 10),
            bill.created_at.format("%Y-%m-%d %H:%M"),
            bill.totals.grand_total.to_string()
        ));
    }
    out
}
