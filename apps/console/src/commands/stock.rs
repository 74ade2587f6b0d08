//! # Stock Commands
//!
//! Sales and cancellations move stock through the bill commands. This
//! module covers manual counts and the audit trail.

use serde::Serialize;

use tsk_core::{StockMovement, StockReference};
use tsk_db::Reconciliation;

use super::{cell, CommandResult, Context};
use crate::cli::StockCommand;

pub async fn run(ctx: &Context, cmd: StockCommand) -> CommandResult {
    let ledger = ctx.db.ledger();

    match cmd {
        StockCommand::Set {
            item,
            quantity,
            notes,
            staff,
        } => {
            let item = ctx.item(&item).await?;
            let staff_id = match staff {
                Some(key) => Some(ctx.staff(&key).await?.id),
                None => None,
            };
            let reference = StockReference::adjustment(staff_id.as_deref());

            let movement = ledger.set_absolute(&item.id, quantity, &reference, notes).await?;
            ctx.emit(&movement, || match &movement {
                Some(m) => format!("{}: {} → {} ({:+})", item.name, item.stock_quantity, quantity, m.quantity),
                None => format!("{}: already {}", item.name, quantity),
            })
        }
        StockCommand::History { item, limit } => {
            let item = ctx.item(&item).await?;
            let movements = ledger.movements(&item.id, limit).await?;
            ctx.emit(&movements, || history(&movements))
        }
        StockCommand::Check { item } => {
            let item = ctx.item(&item).await?;
            let report = ledger.reconcile(&item.id).await?;
            ctx.emit(&report, || check(&item.name, &report))
        }
    }
}

fn history(movements: &[StockMovement]) -> String {
    let mut out = format!(
        "{} {:>6} {} {} NOTES",
        cell("WHEN", 16),
        "QTY",
        cell("TYPE", 10),
        cell("REFERENCE", 12)
    );
    for m in movements {
        out.push_str(&format!(
            "\n{} {:>+6} {} {} {}",
            m.created_at.format("%Y-%m-%d %H:%M"),
            m.quantity,
            cell(&label(&m.movement_type), 10),
            cell(&label(&m.reference_type), 12),
            m.notes.as_deref().unwrap_or("")
        ));
    }
    out
}

/// The serialized name of a unit enum, e.g. `BILL_CANCEL`.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => "?".to_string(),
    }
}

fn check(name: &str, report: &Reconciliation) -> String {
    if report.is_balanced() {
        format!("{}: {} in stock, matches movements", name, report.stock_quantity)
    } else {
        format!(
            "{}: {} in stock but movements total {} (drift {:+})",
            name,
            report.stock_quantity,
            report.movement_total,
            report.drift()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsk_core::{MovementType, ReferenceType};

    #[test]
    fn test_label_uses_serialized_name() {
        assert_eq!(label(&ReferenceType::BillCancel), "BILL_CANCEL");
        assert_eq!(label(&MovementType::Adjustment), "ADJUSTMENT");
    }

    #[test]
    fn test_check_reports_drift() {
        let balanced = Reconciliation {
            item_id: "item-1".to_string(),
            stock_quantity: 8,
            movement_total: 8,
        };
        assert_eq!(check("Saree", &balanced), "Saree: 8 in stock, matches movements");

        let drifted = Reconciliation {
            movement_total: 10,
            ..balanced
        };
        assert_eq!(
            check("Saree", &drifted),
            "Saree: 8 in stock but movements total 10 (drift -2)"
        );
    }
}
