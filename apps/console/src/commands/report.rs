//! # Report Commands
//!
//! Every report covers FINALIZED bills in an inclusive range of local
//! days. With no `--from`/`--to` the range is today.

use chrono::Local;

use tsk_db::{DateRange, GstSummary, PaymentBreakdown, SalesSummary, StaffPerformance};

use super::{cell, CommandResult, Context};
use crate::cli::{RangeArgs, ReportCommand};
use crate::error::AppError;

pub async fn run(ctx: &Context, cmd: ReportCommand) -> CommandResult {
    let reports = ctx.db.reports();

    match cmd {
        ReportCommand::Sales(range) => {
            let summary = reports.sales_summary(resolve_range(&range)?).await?;
            ctx.emit(&summary, || sales(&summary))
        }
        ReportCommand::Gst(range) => {
            let summary = reports.gst_summary(resolve_range(&range)?).await?;
            ctx.emit(&summary, || gst(&summary))
        }
        ReportCommand::Payments(range) => {
            let rows = reports.payment_breakdown(resolve_range(&range)?).await?;
            ctx.emit(&rows, || payments(&rows))
        }
        ReportCommand::Staff(range) => {
            let rows = reports.staff_performance(resolve_range(&range)?).await?;
            ctx.emit(&rows, || staff(&rows))
        }
        ReportCommand::Bills { range, staff } => {
            let range = resolve_range(&range)?;
            let staff_id = match staff {
                Some(key) => Some(ctx.staff(&key).await?.id),
                None => None,
            };
            let bills = reports.bills_between(range, staff_id.as_deref()).await?;
            ctx.emit(&bills, || {
                let mut out = format!(
                    "{} {} {} {} {} {:>5} {:>12}",
                    cell("INVOICE", 18),
                    cell("FINALIZED", 16),
                    cell("STAFF", 16),
                    cell("CUSTOMER", 16),
                    cell("PAID", 5),
                    "ITEMS",
                    "TOTAL"
                );
                for bill in &bills {
                    out.push_str(&format!(
                        "\n{} {} {} {} {} {:>5} {:>12}",
                        cell(&bill.invoice_number, 18),
                        bill.finalized_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        cell(&bill.staff_name, 16),
                        cell(bill.customer_name.as_deref().unwrap_or("Walk-in"), 16),
                        cell(bill.payment_mode.map(|m| m.as_str()).unwrap_or("-"), 5),
                        bill.item_count,
                        bill.grand_total.to_string()
                    ));
                }
                out
            })
        }
        ReportCommand::LowStock { threshold } => {
            let items = reports.low_stock(threshold).await?;
            ctx.emit(&items, || {
                let mut out = format!("{} {} {:>6}", cell("BARCODE", 16), cell("NAME", 32), "STOCK");
                for item in &items {
                    out.push_str(&format!(
                        "\n{} {} {:>6}",
                        cell(item.barcode.as_deref().unwrap_or("-"), 16),
                        cell(&item.name, 32),
                        item.stock_quantity
                    ));
                }
                out
            })
        }
    }
}

/// Fills missing ends with today. A lone `--from` runs through today.
fn resolve_range(args: &RangeArgs) -> Result<DateRange, AppError> {
    let today = Local::now().date_naive();
    let to = args.to.unwrap_or(today);
    let from = args.from.unwrap_or(to);
    DateRange::new(from, to).map_err(|e| AppError::validation(e.to_string()))
}

fn heading(title: &str, range: &DateRange) -> String {
    if range.from == range.to {
        format!("{} for {}", title, range.from)
    } else {
        format!("{} for {} to {}", title, range.from, range.to)
    }
}

fn sales(summary: &SalesSummary) -> String {
    format!(
        "{}\n  bills          {}\n  sales          {}\n  gst            {}\n  discounts      {}\n  average bill   {}",
        heading("Sales", &summary.range),
        summary.bill_count,
        summary.total_sales,
        summary.total_gst,
        summary.total_discount,
        summary.average_bill
    )
}

fn gst(summary: &GstSummary) -> String {
    format!(
        "{}\n  bills          {}\n  taxable value  {}\n  cgst           {}\n  sgst           {}\n  igst           {}\n  total gst      {}",
        heading("GST", &summary.range),
        summary.bill_count,
        summary.taxable_value,
        summary.cgst,
        summary.sgst,
        summary.igst,
        summary.total_gst
    )
}

fn payments(rows: &[PaymentBreakdown]) -> String {
    let mut out = format!("{} {:>6} {:>14}", cell("MODE", 6), "BILLS", "AMOUNT");
    for row in rows {
        out.push_str(&format!(
            "\n{} {:>6} {:>14}",
            cell(row.payment_mode.as_str(), 6),
            row.bill_count,
            row.amount.to_string()
        ));
    }
    out
}

fn staff(rows: &[StaffPerformance]) -> String {
    let mut out = format!("{} {:>6} {:>6} {:>14}", cell("STAFF", 24), "BILLS", "ITEMS", "SALES");
    for row in rows {
        out.push_str(&format!(
            "\n{} {:>6} {:>6} {:>14}",
            cell(&row.staff_name, 24),
            row.bill_count,
            row.items_sold,
            row.total_sales.to_string()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tsk_core::Money;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    #[test]
    fn test_resolve_range_defaults() {
        let today = Local::now().date_naive();

        let range = resolve_range(&RangeArgs { from: None, to: None }).unwrap();
        assert_eq!(range, DateRange::day(today));

        let range = resolve_range(&RangeArgs { from: None, to: Some(date(5)) }).unwrap();
        assert_eq!(range, DateRange::day(date(5)));

        let range = resolve_range(&RangeArgs { from: Some(date(1)), to: Some(date(17)) }).unwrap();
        assert_eq!((range.from, range.to), (date(1), date(17)));
    }

    #[test]
    fn test_resolve_range_rejects_reversed_dates() {
        let err = resolve_range(&RangeArgs { from: Some(date(17)), to: Some(date(1)) }).unwrap_err();
        assert_eq!(err.code.as_str(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_sales_rendering() {
        let summary = SalesSummary {
            range: DateRange::day(date(17)),
            bill_count: 2,
            total_sales: Money::from_rupees(3150),
            total_gst: Money::from_rupees(150),
            total_discount: Money::zero(),
            average_bill: Money::from_rupees(1575),
        };
        let text = sales(&summary);
        assert!(text.starts_with("Sales for 2026-10-17\n"));
        assert!(text.contains("average bill   ₹1575.00"));
    }
}
