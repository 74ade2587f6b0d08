//! # Billing Service
//!
//! Drives a bill through its lifecycle, one transaction per operation.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_draft(staff, customer)                                         │
//! │     └── staff active? customer known? → sequencer → insert_bill        │
//! │         (retry on collision)                                           │
//! │                                                                         │
//! │  add_line / update_line / remove_line            (DRAFT only)          │
//! │     └── load bill → Bill::add_line(..) → replace_lines                 │
//! │         totals stay stale until recompute_totals                       │
//! │                                                                         │
//! │  recompute_totals(bill, discount, interstate)    (DRAFT only)          │
//! │     └── Bill::recompute_totals → update_bill_totals + replace_lines    │
//! │                                                                         │
//! │  finalize(bill, mode)                                                  │
//! │     BEGIN                                                               │
//! │     ├── Bill::finalize        fresh totals from lines                  │
//! │     ├── update_bill_totals + replace_lines                             │
//! │     ├── mark_finalized        WHERE status = 'DRAFT'                   │
//! │     ├── ledger::deduct × N    any failure → drop tx → ROLLBACK         │
//! │     COMMIT                                                              │
//! │                                                                         │
//! │  cancel(bill)                                                          │
//! │     BEGIN → mark_cancelled → ledger::restore_in × N → COMMIT           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation reloads the bill inside its transaction, so the service
//! holds no state between calls and stale copies held by a caller are never
//! written back.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use tsk_core::{
    Bill, BillTotals, CoreError, Percent, PaymentMode, StockReference, MAX_INVOICE_ATTEMPTS,
};

use crate::error::DbResult;
use crate::ledger;
use crate::repository::{bill, customer, item, staff};
use crate::sequencer;

/// Loads a bill or fails with `BillNotFound`.
async fn load_bill(conn: &mut SqliteConnection, bill_id: &str) -> DbResult<Bill> {
    bill::fetch_bill(conn, bill_id)
        .await?
        .ok_or_else(|| CoreError::BillNotFound(bill_id.to_string()).into())
}

/// Bill lifecycle operations.
#[derive(Debug, Clone)]
pub struct BillingService {
    pool: SqlitePool,
}

impl BillingService {
    pub fn new(pool: SqlitePool) -> Self {
        BillingService { pool }
    }

    // =========================================================================
    // Drafts
    // =========================================================================

    /// Opens an empty draft with a freshly assigned invoice number.
    ///
    /// `customer_id` is `None` for a walk-in sale.
    ///
    /// ## Invoice Collisions
    /// A UNIQUE violation on `invoice_number` means another terminal took
    /// the number first; the draft is retried with a fresh number, up to
    /// `MAX_INVOICE_ATTEMPTS` times.
    pub async fn create_draft(&self, staff_id: &str, customer_id: Option<&str>) -> DbResult<Bill> {
        let mut last_number = String::new();

        for attempt in 0..MAX_INVOICE_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let member = staff::fetch_staff(&mut tx, staff_id)
                .await?
                .ok_or_else(|| CoreError::StaffNotFound(staff_id.to_string()))?;
            if !member.is_active {
                return Err(CoreError::StaffInactive(member.name).into());
            }
            if let Some(customer_id) = customer_id {
                if customer::fetch_customer(&mut tx, customer_id).await?.is_none() {
                    return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
                }
            }

            let prefix = sequencer::invoice_prefix(&mut tx).await;
            let number = sequencer::next_number(&mut tx, &prefix, attempt).await;
            let mut draft = Bill::new_draft(number.clone(), staff_id);
            draft.customer_id = customer_id.map(str::to_string);

            match bill::insert_bill(&mut tx, &draft).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(
                        bill_id = %draft.id,
                        invoice_number = %draft.invoice_number,
                        staff = %member.name,
                        "Draft bill created"
                    );
                    return Ok(draft);
                }
                Err(e) if e.is_unique_violation_on("invoice_number") => {
                    warn!(invoice_number = %number, attempt, "Invoice number taken, retrying");
                    last_number = number;
                }
                Err(e) => return Err(e),
            }
        }

        Err(CoreError::DuplicateInvoiceNumber {
            invoice_number: last_number,
            attempts: MAX_INVOICE_ATTEMPTS,
        }
        .into())
    }

    pub async fn get_bill(&self, bill_id: &str) -> DbResult<Bill> {
        let mut conn = self.pool.acquire().await?;
        load_bill(&mut conn, bill_id).await
    }

    /// Deletes a draft. Nothing was deducted, so the ledger is untouched.
    pub async fn discard_draft(&self, bill_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let draft = load_bill(&mut tx, bill_id).await?;
        draft.ensure_draft("discard")?;

        bill::delete_draft(&mut tx, bill_id).await?;
        tx.commit().await?;

        info!(bill_id = %bill_id, invoice_number = %draft.invoice_number, "Draft discarded");
        Ok(())
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Adds `quantity` of a catalog item, growing its line if already billed.
    ///
    /// Stock is checked against the current catalog value but not deducted.
    pub async fn add_line(
        &self,
        bill_id: &str,
        item_id: &str,
        quantity: i64,
        discount: Percent,
    ) -> DbResult<Bill> {
        let mut tx = self.pool.begin().await?;
        let mut draft = load_bill(&mut tx, bill_id).await?;

        let catalog_item = item::fetch_item(&mut tx, item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

        let line_id = draft.add_line(&catalog_item.snapshot(), quantity, discount)?;
        bill::replace_lines(&mut tx, &draft).await?;
        bill::touch_draft(&mut tx, &draft).await?;
        tx.commit().await?;

        debug!(bill_id = %bill_id, line_id = %line_id, item = %catalog_item.name, quantity, "Line added");
        Ok(draft)
    }

    /// Sets a line's quantity and discount. Totals stay stale.
    pub async fn update_line(
        &self,
        bill_id: &str,
        line_id: &str,
        quantity: i64,
        discount: Percent,
    ) -> DbResult<Bill> {
        let mut tx = self.pool.begin().await?;
        let mut draft = load_bill(&mut tx, bill_id).await?;

        let available = match draft.line(line_id)?.item_id.clone() {
            Some(item_id) => item::fetch_stock(&mut tx, &item_id).await?,
            None => None,
        };

        draft.update_line(line_id, quantity, discount, available)?;
        bill::replace_lines(&mut tx, &draft).await?;
        bill::touch_draft(&mut tx, &draft).await?;
        tx.commit().await?;

        debug!(bill_id = %bill_id, line_id = %line_id, quantity, "Line updated");
        Ok(draft)
    }

    /// Removes a line. Totals stay stale.
    pub async fn remove_line(&self, bill_id: &str, line_id: &str) -> DbResult<Bill> {
        let mut tx = self.pool.begin().await?;
        let mut draft = load_bill(&mut tx, bill_id).await?;

        let removed = draft.remove_line(line_id)?;
        bill::replace_lines(&mut tx, &draft).await?;
        bill::touch_draft(&mut tx, &draft).await?;
        tx.commit().await?;

        debug!(bill_id = %bill_id, item = %removed.item_name, "Line removed");
        Ok(draft)
    }

    /// Recomputes every line and the bill totals, and persists them.
    ///
    /// The returned totals are the stored ones, settled to paise.
    pub async fn recompute_totals(
        &self,
        bill_id: &str,
        bill_discount: Percent,
        is_interstate: bool,
    ) -> DbResult<BillTotals> {
        let mut tx = self.pool.begin().await?;
        let mut draft = load_bill(&mut tx, bill_id).await?;

        let totals = draft.recompute_totals(bill_discount, is_interstate)?.settled();
        bill::update_bill_totals(&mut tx, &draft).await?;
        bill::replace_lines(&mut tx, &draft).await?;
        tx.commit().await?;

        debug!(bill_id = %bill_id, grand_total = %totals.grand_total, "Totals recomputed");
        Ok(totals)
    }

    // =========================================================================
    // Finalize / Cancel
    // =========================================================================

    /// Locks the bill and deducts stock for every line, all or nothing.
    ///
    /// Totals are recomputed here from the lines with the bill's stored
    /// discount and interstate flag; previously stored totals are ignored.
    ///
    /// ## Errors
    /// * `InvalidBillStatus` - Not a draft (including a second finalize)
    /// * `EmptyBill` - No lines
    /// * `InsufficientStock` / `ItemNotFound` - A line cannot be deducted;
    ///   no stock or status change is kept
    pub async fn finalize(&self, bill_id: &str, payment_mode: PaymentMode) -> DbResult<Bill> {
        let mut tx = self.pool.begin().await?;
        let mut draft = load_bill(&mut tx, bill_id).await?;

        draft.finalize(payment_mode)?;
        draft.totals = draft.totals.settled();

        // totals and lines are written while the row is still DRAFT
        bill::update_bill_totals(&mut tx, &draft).await?;
        bill::replace_lines(&mut tx, &draft).await?;
        bill::mark_finalized(&mut tx, &draft).await?;

        let reference = StockReference::bill(&draft.id, &draft.staff_id);
        for line in &draft.lines {
            let item_id = line
                .item_id
                .as_deref()
                .ok_or_else(|| CoreError::ItemNotFound(line.item_name.clone()))?;
            ledger::deduct(&mut tx, item_id, line.quantity, &reference).await?;
        }

        tx.commit().await?;

        info!(
            bill_id = %draft.id,
            invoice_number = %draft.invoice_number,
            payment_mode = %payment_mode,
            grand_total = %draft.totals.grand_total,
            lines = draft.lines.len(),
            "Bill finalized"
        );
        Ok(draft)
    }

    /// Cancels a finalized bill and returns its stock.
    ///
    /// Lines whose catalog item has since been deleted have no stock to
    /// return and are skipped.
    pub async fn cancel(&self, bill_id: &str) -> DbResult<Bill> {
        let mut tx = self.pool.begin().await?;
        let mut finalized = load_bill(&mut tx, bill_id).await?;

        finalized.cancel()?;
        bill::mark_cancelled(&mut tx, &finalized).await?;

        let reference = StockReference::bill_cancel(&finalized.id, &finalized.staff_id);
        for line in &finalized.lines {
            match line.item_id.as_deref() {
                Some(item_id) => {
                    ledger::restore_in(&mut tx, item_id, line.quantity, &reference).await?;
                }
                None => {
                    warn!(bill_id = %bill_id, item = %line.item_name, "Item deleted, stock not restored");
                }
            }
        }

        tx.commit().await?;

        info!(
            bill_id = %finalized.id,
            invoice_number = %finalized.invoice_number,
            "Bill cancelled"
        );
        Ok(finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::item::NewItem;
    use crate::{Database, DbConfig};
    use tsk_core::{BillStatus, Money};

    async fn setup() -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let staff = db.staff().insert("Lakshmi").await.unwrap();
        let item = db
            .items()
            .insert(
                NewItem {
                    barcode: Some("TSK-DHT-010".to_string()),
                    name: "Cotton Dhoti".to_string(),
                    hsn_code: Some("5208".to_string()),
                    category: Some("Dhoti".to_string()),
                    price: Money::from_rupees(1000),
                    gst_rate: Percent::from_whole(5),
                    stock_quantity: 10,
                },
                None,
            )
            .await
            .unwrap();
        (db, staff.id, item.id)
    }

    #[tokio::test]
    async fn test_create_draft_assigns_sequence() {
        let (db, staff_id, _) = setup().await;
        let billing = db.billing();

        let first = billing.create_draft(&staff_id, None).await.unwrap();
        let second = billing.create_draft(&staff_id, None).await.unwrap();
        assert_eq!(first.invoice_number, "TSK000001");
        assert_eq!(second.invoice_number, "TSK000002");
        assert_eq!(first.status, BillStatus::Draft);
    }

    #[tokio::test]
    async fn test_create_draft_checks_staff() {
        let (db, staff_id, _) = setup().await;

        let err = db.billing().create_draft("nobody", None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::StaffNotFound(_))));

        db.staff().deactivate(&staff_id).await.unwrap();
        let err = db.billing().create_draft(&staff_id, None).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::StaffInactive(_))));
    }

    #[tokio::test]
    async fn test_create_draft_records_customer() {
        let (db, staff_id, _) = setup().await;
        let billing = db.billing();
        let customer = db.customers().insert("Meena", Some("9876543210"), None).await.unwrap();

        let draft = billing.create_draft(&staff_id, Some(&customer.id)).await.unwrap();
        let stored = billing.get_bill(&draft.id).await.unwrap();
        assert_eq!(stored.customer_id.as_deref(), Some(customer.id.as_str()));

        let walk_in = billing.create_draft(&staff_id, None).await.unwrap();
        assert!(billing.get_bill(&walk_in.id).await.unwrap().customer_id.is_none());

        let err = billing.create_draft(&staff_id, Some("nobody")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_lines_persist_and_combine() {
        let (db, staff_id, item_id) = setup().await;
        let billing = db.billing();
        let draft = billing.create_draft(&staff_id, None).await.unwrap();

        billing.add_line(&draft.id, &item_id, 2, Percent::from_whole(10)).await.unwrap();
        let bill = billing.add_line(&draft.id, &item_id, 3, Percent::zero()).await.unwrap();
        assert_eq!(bill.lines.len(), 1);
        assert_eq!(bill.lines[0].quantity, 5);

        let reloaded = billing.get_bill(&draft.id).await.unwrap();
        assert_eq!(reloaded.lines, bill.lines);

        let err = billing.add_line(&draft.id, &item_id, 6, Percent::zero()).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 10, requested: 11, .. })
        ));

        let line_id = bill.lines[0].id.clone();
        let bill = billing.update_line(&draft.id, &line_id, 2, Percent::from_whole(10)).await.unwrap();
        assert_eq!(bill.lines[0].calc.line_total, Money::from_rupees(1890));

        let bill = billing.remove_line(&draft.id, &line_id).await.unwrap();
        assert!(bill.lines.is_empty());
        assert!(billing.get_bill(&draft.id).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_empty_bill_cannot_finalize() {
        let (db, staff_id, _) = setup().await;
        let draft = db.billing().create_draft(&staff_id, None).await.unwrap();

        let err = db.billing().finalize(&draft.id, PaymentMode::Cash).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyBill(_))));
    }

    #[tokio::test]
    async fn test_cancel_draft_rejected_discard_allowed() {
        let (db, staff_id, item_id) = setup().await;
        let billing = db.billing();
        let draft = billing.create_draft(&staff_id, None).await.unwrap();
        billing.add_line(&draft.id, &item_id, 1, Percent::zero()).await.unwrap();

        let err = billing.cancel(&draft.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidBillStatus { .. })));

        billing.discard_draft(&draft.id).await.unwrap();
        let err = billing.get_bill(&draft.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::BillNotFound(_))));
        assert_eq!(db.items().get_by_id(&item_id).await.unwrap().unwrap().stock_quantity, 10);
    }
}
