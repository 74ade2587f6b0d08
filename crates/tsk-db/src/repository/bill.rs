//! # Bill Repository
//!
//! Rows of `bills` and `bill_items`.
//!
//! ## Bill Lifecycle in SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. CREATE DRAFT                                                       │
//! │     └── insert_bill()              status = 'DRAFT', invoice assigned  │
//! │                                                                         │
//! │  2. EDIT LINES                                                         │
//! │     └── replace_lines()            delete_bill_items + insert_bill_item│
//! │     └── update_bill_totals()       ... WHERE status = 'DRAFT'          │
//! │                                                                         │
//! │  3. FINALIZE                                                           │
//! │     └── mark_finalized()           ... WHERE status = 'DRAFT'          │
//! │                                                                         │
//! │  4. (OPTIONAL) CANCEL                                                  │
//! │     └── mark_cancelled()           ... WHERE status = 'FINALIZED'      │
//! │                                                                         │
//! │  Every status change is a conditional UPDATE: a second finalize of the │
//! │  same bill affects zero rows and fails, even if two callers raced.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line amounts are written for reporting, but a loaded bill always
//! recomputes them from quantity, price, discount and rate.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use tsk_core::{Bill, BillLine, BillStatus, BillTotals, CoreError, LineCalc, PaymentMode};

use super::{money, percent};
use crate::error::{DbError, DbResult};

const BILL_COLUMNS: &str = "id, invoice_number, staff_id, customer_id, status, payment_mode, \
                            bill_discount_bps, is_interstate, subtotal_paise, discount_paise, \
                            cgst_paise, sgst_paise, igst_paise, total_gst_paise, \
                            round_off_paise, grand_total_paise, created_at, updated_at, \
                            finalized_at, cancelled_at";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: String,
    invoice_number: String,
    staff_id: String,
    customer_id: Option<String>,
    status: BillStatus,
    payment_mode: Option<PaymentMode>,
    bill_discount_bps: i64,
    is_interstate: bool,
    subtotal_paise: i64,
    discount_paise: i64,
    cgst_paise: i64,
    sgst_paise: i64,
    igst_paise: i64,
    total_gst_paise: i64,
    round_off_paise: i64,
    grand_total_paise: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct BillItemRow {
    id: String,
    item_id: Option<String>,
    item_name: String,
    barcode: Option<String>,
    unit_price_paise: i64,
    gst_rate_bps: i64,
    quantity: i64,
    discount_bps: i64,
}

impl BillItemRow {
    /// Rebuilds a line and recomputes its amounts from the stored inputs.
    fn into_line(self, is_interstate: bool) -> DbResult<BillLine> {
        let mut line = BillLine {
            id: self.id,
            item_id: self.item_id,
            item_name: self.item_name,
            barcode: self.barcode,
            unit_price: money(self.unit_price_paise),
            gst_rate: percent(self.gst_rate_bps),
            quantity: self.quantity,
            discount: percent(self.discount_bps),
            calc: LineCalc::default(),
        };

        match line.recalculate(is_interstate).map(|_| ()) {
            Ok(()) => Ok(line),
            Err(err) => Err(DbError::corrupt("bill_items", &line.id, err)),
        }
    }
}

impl BillRow {
    fn into_bill(self, lines: Vec<BillItemRow>) -> DbResult<Bill> {
        let lines = lines
            .into_iter()
            .map(|row| row.into_line(self.is_interstate))
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Bill {
            id: self.id,
            invoice_number: self.invoice_number,
            staff_id: self.staff_id,
            customer_id: self.customer_id,
            status: self.status,
            payment_mode: self.payment_mode,
            bill_discount: percent(self.bill_discount_bps),
            is_interstate: self.is_interstate,
            lines,
            totals: BillTotals {
                subtotal: money(self.subtotal_paise),
                discount_amount: money(self.discount_paise),
                cgst: money(self.cgst_paise),
                sgst: money(self.sgst_paise),
                igst: money(self.igst_paise),
                total_gst: money(self.total_gst_paise),
                round_off: money(self.round_off_paise),
                grand_total: money(self.grand_total_paise),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            finalized_at: self.finalized_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

// =============================================================================
// Connection Functions: Reads
// =============================================================================

async fn fetch_lines(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Vec<BillItemRow>> {
    let rows: Vec<BillItemRow> = sqlx::query_as(
        r#"
        SELECT id, item_id, item_name, barcode, unit_price_paise,
               gst_rate_bps, quantity, discount_bps
        FROM bill_items
        WHERE bill_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(bill_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Loads a bill with its lines.
pub async fn fetch_bill(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Option<Bill>> {
    let row: Option<BillRow> =
        sqlx::query_as(&format!("SELECT {} FROM bills WHERE id = ?1", BILL_COLUMNS))
            .bind(bill_id)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        Some(row) => {
            let lines = fetch_lines(conn, &row.id).await?;
            row.into_bill(lines).map(Some)
        }
        None => Ok(None),
    }
}

/// Loads a bill by invoice number.
pub async fn fetch_bill_by_invoice(
    conn: &mut SqliteConnection,
    invoice_number: &str,
) -> DbResult<Option<Bill>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM bills WHERE invoice_number = ?1")
        .bind(invoice_number.trim())
        .fetch_optional(&mut *conn)
        .await?;

    match id {
        Some(id) => fetch_bill(conn, &id).await,
        None => Ok(None),
    }
}

/// `max_invoice_suffix`: highest numeric suffix among invoices with `prefix`.
///
/// ## Returns
/// * `Ok(None)` - No invoice uses the prefix yet
/// * `Err(DbError::CorruptRow)` - Some suffix is empty or not all digits
pub async fn max_invoice_suffix(conn: &mut SqliteConnection, prefix: &str) -> DbResult<Option<i64>> {
    let (max, malformed): (Option<i64>, i64) = sqlx::query_as(
        r#"
        SELECT
            MAX(CAST(substr(invoice_number, length(?1) + 1) AS INTEGER)),
            COALESCE(SUM(
                substr(invoice_number, length(?1) + 1) = ''
                OR substr(invoice_number, length(?1) + 1) GLOB '*[^0-9]*'
            ), 0)
        FROM bills
        WHERE substr(invoice_number, 1, length(?1)) = ?1
        "#,
    )
    .bind(prefix)
    .fetch_one(&mut *conn)
    .await?;

    if malformed > 0 {
        return Err(DbError::corrupt(
            "bills",
            prefix,
            format!("{} invoice number(s) with a non-numeric suffix", malformed),
        ));
    }

    Ok(max)
}

// =============================================================================
// Connection Functions: Writes
// =============================================================================

/// `insert_bill`: writes a new draft header.
pub async fn insert_bill(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    debug!(id = %bill.id, invoice_number = %bill.invoice_number, "Inserting bill");

    sqlx::query(
        r#"
        INSERT INTO bills (
            id, invoice_number, staff_id, status, payment_mode,
            bill_discount_bps, is_interstate, created_at, updated_at, customer_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&bill.id)
    .bind(&bill.invoice_number)
    .bind(&bill.staff_id)
    .bind(bill.status)
    .bind(bill.payment_mode)
    .bind(bill.bill_discount.bps())
    .bind(bill.is_interstate)
    .bind(bill.created_at)
    .bind(bill.updated_at)
    .bind(&bill.customer_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `update_bill_totals`: persists discount settings and totals of a draft.
///
/// Totals are written settled to paise (see [`BillTotals::settled`]), so a
/// reloaded bill still adds up.
pub async fn update_bill_totals(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    let totals = bill.totals.settled();

    let result = sqlx::query(
        r#"
        UPDATE bills SET
            bill_discount_bps = ?2,
            is_interstate = ?3,
            subtotal_paise = ?4,
            discount_paise = ?5,
            cgst_paise = ?6,
            sgst_paise = ?7,
            igst_paise = ?8,
            total_gst_paise = ?9,
            round_off_paise = ?10,
            grand_total_paise = ?11,
            updated_at = ?12
        WHERE id = ?1 AND status = 'DRAFT'
        "#,
    )
    .bind(&bill.id)
    .bind(bill.bill_discount.bps())
    .bind(bill.is_interstate)
    .bind(totals.subtotal.to_paise()?)
    .bind(totals.discount_amount.to_paise()?)
    .bind(totals.cgst.to_paise()?)
    .bind(totals.sgst.to_paise()?)
    .bind(totals.igst.to_paise()?)
    .bind(totals.total_gst.to_paise()?)
    .bind(totals.round_off.to_paise()?)
    .bind(totals.grand_total.to_paise()?)
    .bind(bill.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Bill (draft)", &bill.id));
    }

    Ok(())
}

/// Touches `updated_at` of a draft after a line edit.
pub async fn touch_draft(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    let result = sqlx::query("UPDATE bills SET updated_at = ?2 WHERE id = ?1 AND status = 'DRAFT'")
        .bind(&bill.id)
        .bind(bill.updated_at)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Bill (draft)", &bill.id));
    }

    Ok(())
}

/// `insert_bill_item`: writes one line at position `line_no`.
pub async fn insert_bill_item(
    conn: &mut SqliteConnection,
    bill_id: &str,
    line_no: i64,
    line: &BillLine,
) -> DbResult<()> {
    let calc = line.calc.settled();

    sqlx::query(
        r#"
        INSERT INTO bill_items (
            id, bill_id, line_no, item_id, item_name, barcode,
            unit_price_paise, gst_rate_bps, quantity, discount_bps,
            discount_paise, taxable_paise, cgst_paise, sgst_paise, igst_paise,
            line_total_paise
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&line.id)
    .bind(bill_id)
    .bind(line_no)
    .bind(&line.item_id)
    .bind(&line.item_name)
    .bind(&line.barcode)
    .bind(line.unit_price.to_paise()?)
    .bind(line.gst_rate.bps())
    .bind(line.quantity)
    .bind(line.discount.bps())
    .bind(calc.discount_amount.to_paise()?)
    .bind(calc.taxable_amount.to_paise()?)
    .bind(calc.tax.cgst.to_paise()?)
    .bind(calc.tax.sgst.to_paise()?)
    .bind(calc.tax.igst.to_paise()?)
    .bind(calc.line_total.to_paise()?)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// `delete_bill_items`: removes every line of a bill.
pub async fn delete_bill_items(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM bill_items WHERE bill_id = ?1")
        .bind(bill_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Rewrites all lines of a bill in display order.
pub async fn replace_lines(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    delete_bill_items(conn, &bill.id).await?;
    for (index, line) in bill.lines.iter().enumerate() {
        insert_bill_item(conn, &bill.id, index as i64 + 1, line).await?;
    }
    Ok(())
}

/// Locks a draft as finalized. Fails if the bill left DRAFT meanwhile.
pub async fn mark_finalized(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE bills SET
            status = 'FINALIZED',
            payment_mode = ?2,
            finalized_at = ?3,
            updated_at = ?3
        WHERE id = ?1 AND status = 'DRAFT'
        "#,
    )
    .bind(&bill.id)
    .bind(bill.payment_mode)
    .bind(bill.finalized_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::invalid_status(&bill.id, "no longer DRAFT", "finalize").into());
    }

    Ok(())
}

/// Marks a finalized bill as cancelled. Fails unless it is FINALIZED.
pub async fn mark_cancelled(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE bills SET
            status = 'CANCELLED',
            cancelled_at = ?2,
            updated_at = ?2
        WHERE id = ?1 AND status = 'FINALIZED'
        "#,
    )
    .bind(&bill.id)
    .bind(bill.cancelled_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::invalid_status(&bill.id, "no longer FINALIZED", "cancel").into());
    }

    Ok(())
}

/// Deletes a draft and its lines.
pub async fn delete_draft(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<()> {
    delete_bill_items(conn, bill_id).await?;

    let result = sqlx::query("DELETE FROM bills WHERE id = ?1 AND status = 'DRAFT'")
        .bind(bill_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Bill (draft)", bill_id));
    }

    Ok(())
}

// =============================================================================
// Bill Repository
// =============================================================================

/// Read access to bills. Mutations go through `BillingService`.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        fetch_bill(&mut conn, id).await
    }

    pub async fn get_by_invoice(&self, invoice_number: &str) -> DbResult<Option<Bill>> {
        let mut conn = self.pool.acquire().await?;
        fetch_bill_by_invoice(&mut conn, invoice_number).await
    }

    /// Bills in a given status, newest first, without lines.
    pub async fn list_by_status(&self, status: BillStatus, limit: u32) -> DbResult<Vec<Bill>> {
        let rows: Vec<BillRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bills WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2",
            BILL_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| row.into_bill(Vec::new())).collect()
    }
}
