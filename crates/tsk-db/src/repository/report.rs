//! # Report Repository
//!
//! Read-only sales, staff, payment and GST reports.
//!
//! Only FINALIZED bills count. Drafts were never sold and cancelled bills
//! were reversed, so both are filtered out of every query here.
//!
//! ## Date Ranges
//! ```text
//! DateRange { from: 2026-10-01, to: 2026-10-17 }   (local calendar days)
//!      │
//!      ▼  local midnight → UTC
//! finalized_at >= 2026-09-30T18:30:00Z  AND  finalized_at < 2026-10-17T18:30:00Z
//! ```
//! `to` is inclusive: the upper bound is midnight at the start of the next day.

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::SqlitePool;

use tsk_core::validation::ValidationResult;
use tsk_core::{Money, PaymentMode, ValidationError};

use super::settings::SettingsRepository;
use super::{money, money_sum};
use crate::error::DbResult;

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> ValidationResult<Self> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("{} is after {}", from, to),
            });
        }
        Ok(DateRange { from, to })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// Today in local time.
    pub fn today() -> Self {
        DateRange::day(Local::now().date_naive())
    }

    /// Half-open UTC bounds `[start, end)`.
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end_day = self.to.checked_add_days(Days::new(1)).unwrap_or(self.to);
        (local_midnight(self.from), local_midnight(end_day))
    }
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // midnight skipped by a DST jump
        None => naive.and_utc(),
    }
}

// =============================================================================
// Report Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub range: DateRange,
    pub bill_count: i64,
    pub total_sales: Money,
    pub total_gst: Money,
    pub total_discount: Money,
    pub average_bill: Money,
}

/// One finalized bill in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillSummary {
    pub bill_id: String,
    pub invoice_number: String,
    pub staff_id: String,
    pub staff_name: String,
    /// `None` for a walk-in sale.
    pub customer_name: Option<String>,
    pub payment_mode: Option<PaymentMode>,
    pub item_count: i64,
    pub total_gst: Money,
    pub grand_total: Money,
    pub finalized_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffPerformance {
    pub staff_id: String,
    pub staff_name: String,
    pub bill_count: i64,
    pub items_sold: i64,
    pub total_sales: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentBreakdown {
    pub payment_mode: PaymentMode,
    pub bill_count: i64,
    pub amount: Money,
}

/// Tax collected over a period, as filed in a GST return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GstSummary {
    pub range: DateRange,
    pub bill_count: i64,
    pub taxable_value: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_gst: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub item_id: String,
    pub barcode: Option<String>,
    pub name: String,
    pub category: Option<String>,
    pub stock_quantity: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct BillSummaryRow {
    id: String,
    invoice_number: String,
    staff_id: String,
    staff_name: String,
    customer_name: Option<String>,
    payment_mode: Option<PaymentMode>,
    item_count: i64,
    total_gst_paise: i64,
    grand_total_paise: i64,
    finalized_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct StaffPerformanceRow {
    staff_id: String,
    staff_name: String,
    bill_count: i64,
    items_sold: i64,
    sales_paise: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct LowStockRow {
    id: String,
    barcode: Option<String>,
    name: String,
    category: Option<String>,
    stock_quantity: i64,
}

// =============================================================================
// Report Repository
// =============================================================================

/// Repository for reports over finalized bills.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Bill count, sales, tax, discount and average bill value.
    pub async fn sales_summary(&self, range: DateRange) -> DbResult<SalesSummary> {
        let (start, end) = range.bounds();

        let (bill_count, sales, gst, discount): (i64, Option<i64>, Option<i64>, Option<i64>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*), SUM(grand_total_paise), SUM(total_gst_paise), SUM(discount_paise)
                FROM bills
                WHERE status = 'FINALIZED' AND finalized_at >= ?1 AND finalized_at < ?2
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        let total_sales = money_sum(sales);
        let average_bill = if bill_count > 0 {
            Money::from_decimal((total_sales.amount() / Decimal::from(bill_count)).round_dp(2))
        } else {
            Money::zero()
        };

        Ok(SalesSummary {
            range,
            bill_count,
            total_sales,
            total_gst: money_sum(gst),
            total_discount: money_sum(discount),
            average_bill,
        })
    }

    /// Finalized bills in the range, optionally for one staff member.
    pub async fn bills_between(
        &self,
        range: DateRange,
        staff_id: Option<&str>,
    ) -> DbResult<Vec<BillSummary>> {
        let (start, end) = range.bounds();

        let rows: Vec<BillSummaryRow> = sqlx::query_as(
            r#"
            SELECT b.id, b.invoice_number, b.staff_id, s.name AS staff_name,
                   c.name AS customer_name, b.payment_mode,
                   (SELECT COALESCE(SUM(bi.quantity), 0) FROM bill_items bi WHERE bi.bill_id = b.id)
                       AS item_count,
                   b.total_gst_paise, b.grand_total_paise, b.finalized_at
            FROM bills b
            JOIN staff s ON s.id = b.staff_id
            LEFT JOIN customers c ON c.id = b.customer_id
            WHERE b.status = 'FINALIZED'
              AND b.finalized_at >= ?1 AND b.finalized_at < ?2
              AND (?3 IS NULL OR b.staff_id = ?3)
            ORDER BY b.finalized_at, b.invoice_number
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BillSummary {
                bill_id: row.id,
                invoice_number: row.invoice_number,
                staff_id: row.staff_id,
                staff_name: row.staff_name,
                customer_name: row.customer_name,
                payment_mode: row.payment_mode,
                item_count: row.item_count,
                total_gst: money(row.total_gst_paise),
                grand_total: money(row.grand_total_paise),
                finalized_at: row.finalized_at,
            })
            .collect())
    }

    /// Per staff totals, best seller first.
    pub async fn staff_performance(&self, range: DateRange) -> DbResult<Vec<StaffPerformance>> {
        let (start, end) = range.bounds();

        let rows: Vec<StaffPerformanceRow> = sqlx::query_as(
            r#"
            SELECT s.id AS staff_id, s.name AS staff_name,
                   COUNT(b.id) AS bill_count,
                   COALESCE(SUM(q.units), 0) AS items_sold,
                   COALESCE(SUM(b.grand_total_paise), 0) AS sales_paise
            FROM bills b
            JOIN staff s ON s.id = b.staff_id
            LEFT JOIN (
                SELECT bill_id, SUM(quantity) AS units FROM bill_items GROUP BY bill_id
            ) q ON q.bill_id = b.id
            WHERE b.status = 'FINALIZED' AND b.finalized_at >= ?1 AND b.finalized_at < ?2
            GROUP BY s.id, s.name
            ORDER BY sales_paise DESC, s.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StaffPerformance {
                staff_id: row.staff_id,
                staff_name: row.staff_name,
                bill_count: row.bill_count,
                items_sold: row.items_sold,
                total_sales: money(row.sales_paise),
            })
            .collect())
    }

    /// Count and amount per payment mode. Modes with no bills are omitted.
    pub async fn payment_breakdown(&self, range: DateRange) -> DbResult<Vec<PaymentBreakdown>> {
        let (start, end) = range.bounds();

        let rows: Vec<(PaymentMode, i64, i64)> = sqlx::query_as(
            r#"
            SELECT payment_mode, COUNT(*), COALESCE(SUM(grand_total_paise), 0)
            FROM bills
            WHERE status = 'FINALIZED' AND finalized_at >= ?1 AND finalized_at < ?2
              AND payment_mode IS NOT NULL
            GROUP BY payment_mode
            ORDER BY payment_mode
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(payment_mode, bill_count, amount)| PaymentBreakdown {
                payment_mode,
                bill_count,
                amount: money(amount),
            })
            .collect())
    }

    /// Taxable value (after bill discounts) and tax collected.
    pub async fn gst_summary(&self, range: DateRange) -> DbResult<GstSummary> {
        let (start, end) = range.bounds();

        #[allow(clippy::type_complexity)]
        let (bill_count, taxable, cgst, sgst, igst, total): (
            i64,
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   SUM(subtotal_paise - discount_paise),
                   SUM(cgst_paise), SUM(sgst_paise), SUM(igst_paise), SUM(total_gst_paise)
            FROM bills
            WHERE status = 'FINALIZED' AND finalized_at >= ?1 AND finalized_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(GstSummary {
            range,
            bill_count,
            taxable_value: money_sum(taxable),
            cgst: money_sum(cgst),
            sgst: money_sum(sgst),
            igst: money_sum(igst),
            total_gst: money_sum(total),
        })
    }

    /// Active items at or below `threshold`, or the configured threshold.
    pub async fn low_stock(&self, threshold: Option<i64>) -> DbResult<Vec<LowStockItem>> {
        let threshold = match threshold {
            Some(threshold) => threshold,
            None => SettingsRepository::new(self.pool.clone()).low_stock_threshold().await?,
        };

        let rows: Vec<LowStockRow> = sqlx::query_as(
            r#"
            SELECT id, barcode, name, category, stock_quantity
            FROM items
            WHERE is_active = 1 AND stock_quantity <= ?1
            ORDER BY stock_quantity, name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LowStockItem {
                item_id: row.id,
                barcode: row.barcode,
                name: row.name,
                category: row.category,
                stock_quantity: row.stock_quantity,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_rejects_reversed_dates() {
        let from = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert!(DateRange::new(from, to).is_err());
        assert!(DateRange::new(to, from).is_ok());
    }

    #[test]
    fn test_bounds_cover_whole_days() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let (start, end) = DateRange::day(day).bounds();
        assert_eq!(end - start, chrono::Duration::hours(24));
        assert_eq!(start.with_timezone(&Local).date_naive(), day);
    }
}
