//! End-to-end billing flows against a real SQLite database.

use tsk_core::{BillStatus, CoreError, Money, PaymentMode, Percent, ReferenceType, StockMovement};
use tsk_db::repository::stock;
use tsk_db::{Database, DateRange, DbConfig, DbError, NewItem};

// =============================================================================
// Fixtures
// =============================================================================

async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn add_item(db: &Database, barcode: &str, rupees: i64, gst_whole: i64, stock: i64) -> String {
    db.items()
        .insert(
            NewItem {
                barcode: Some(barcode.to_string()),
                name: format!("Fabric {}", barcode),
                hsn_code: Some("5208".to_string()),
                category: Some("Fabric".to_string()),
                price: Money::from_rupees(rupees),
                gst_rate: Percent::from_whole(gst_whole),
                stock_quantity: stock,
            },
            None,
        )
        .await
        .unwrap()
        .id
}

async fn add_staff(db: &Database, name: &str) -> String {
    db.staff().insert(name).await.unwrap().id
}

async fn stock_of(db: &Database, item_id: &str) -> i64 {
    db.items().get_by_id(item_id).await.unwrap().unwrap().stock_quantity
}

async fn movements_for(db: &Database, kind: ReferenceType, bill_id: &str) -> Vec<StockMovement> {
    let mut conn = db.pool().acquire().await.unwrap();
    stock::fetch_for_reference(&mut conn, kind, bill_id).await.unwrap()
}

/// Creates, fills and finalizes a bill.
async fn sell(
    db: &Database,
    staff_id: &str,
    lines: &[(&str, i64)],
    mode: PaymentMode,
) -> tsk_core::Bill {
    let billing = db.billing();
    let draft = billing.create_draft(staff_id, None).await.unwrap();
    for (item_id, quantity) in lines {
        billing.add_line(&draft.id, item_id, *quantity, Percent::zero()).await.unwrap();
    }
    billing.finalize(&draft.id, mode).await.unwrap()
}

// =============================================================================
// Finalize / Cancel
// =============================================================================

#[tokio::test]
async fn finalize_then_cancel_restores_stock_with_paired_movements() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;
    let shirt = add_item(&db, "SHT-002", 600, 12, 5).await;

    let billing = db.billing();
    let draft = billing.create_draft(&staff, None).await.unwrap();
    billing.add_line(&draft.id, &saree, 2, Percent::from_whole(10)).await.unwrap();
    billing.add_line(&draft.id, &shirt, 1, Percent::zero()).await.unwrap();

    let finalized = billing.finalize(&draft.id, PaymentMode::Card).await.unwrap();
    assert_eq!(finalized.status, BillStatus::Finalized);
    assert_eq!(finalized.payment_mode, Some(PaymentMode::Card));
    assert_eq!(stock_of(&db, &saree).await, 8);
    assert_eq!(stock_of(&db, &shirt).await, 4);

    let out = movements_for(&db, ReferenceType::Bill, &draft.id).await;
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|m| m.quantity < 0 && m.staff_id.as_deref() == Some(staff.as_str())));

    let cancelled = billing.cancel(&draft.id).await.unwrap();
    assert_eq!(cancelled.status, BillStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(stock_of(&db, &saree).await, 10);
    assert_eq!(stock_of(&db, &shirt).await, 5);

    let back = movements_for(&db, ReferenceType::BillCancel, &draft.id).await;
    assert_eq!(back.len(), 2);
    for (o, b) in out.iter().zip(&back) {
        assert_eq!(o.item_id, b.item_id);
        assert_eq!(o.quantity, -b.quantity);
    }

    assert!(db.ledger().reconcile(&saree).await.unwrap().is_balanced());
    assert!(db.ledger().reconcile(&shirt).await.unwrap().is_balanced());

    // cancelled bills stay cancelled
    let err = billing.cancel(&draft.id).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidBillStatus { .. })));
}

#[tokio::test]
async fn add_line_beyond_stock_is_rejected() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;

    let draft = db.billing().create_draft(&staff, None).await.unwrap();
    let err = db
        .billing()
        .add_line(&draft.id, &saree, 15, Percent::zero())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { available: 10, requested: 15, .. })
    ));
    assert_eq!(stock_of(&db, &saree).await, 10);
    assert!(db.billing().get_bill(&draft.id).await.unwrap().lines.is_empty());
}

#[tokio::test]
async fn failed_finalize_rolls_back_every_line() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;
    let dhoti = add_item(&db, "DHT-003", 400, 5, 10).await;

    let billing = db.billing();
    let draft = billing.create_draft(&staff, None).await.unwrap();
    billing.add_line(&draft.id, &saree, 5, Percent::zero()).await.unwrap();
    billing.add_line(&draft.id, &dhoti, 10, Percent::zero()).await.unwrap();

    // another counter sells dhotis before this bill is finalized
    sell(&db, &staff, &[(dhoti.as_str(), 3)], PaymentMode::Cash).await;
    assert_eq!(stock_of(&db, &dhoti).await, 7);

    let err = billing.finalize(&draft.id, PaymentMode::Cash).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { available: 7, requested: 10, .. })
    ));

    assert_eq!(stock_of(&db, &saree).await, 10);
    assert_eq!(stock_of(&db, &dhoti).await, 7);
    assert!(movements_for(&db, ReferenceType::Bill, &draft.id).await.is_empty());

    let still_draft = billing.get_bill(&draft.id).await.unwrap();
    assert_eq!(still_draft.status, BillStatus::Draft);
    assert!(still_draft.payment_mode.is_none());
}

#[tokio::test]
async fn second_finalize_is_rejected() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;

    let bill = sell(&db, &staff, &[(saree.as_str(), 1)], PaymentMode::Upi).await;

    let err = db.billing().finalize(&bill.id, PaymentMode::Cash).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidBillStatus { .. })));
    assert_eq!(stock_of(&db, &saree).await, 9);

    let err = db
        .billing()
        .add_line(&bill.id, &saree, 1, Percent::zero())
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidBillStatus { .. })));
}

#[tokio::test]
async fn cancel_skips_lines_of_deleted_items() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;
    let shirt = add_item(&db, "SHT-002", 600, 12, 5).await;

    let bill = sell(&db, &staff, &[(saree.as_str(), 1), (shirt.as_str(), 2)], PaymentMode::Cash).await;
    db.items().delete(&saree).await.unwrap();

    let reloaded = db.billing().get_bill(&bill.id).await.unwrap();
    assert!(reloaded.lines[0].item_id.is_none());
    assert_eq!(reloaded.lines[0].item_name, "Fabric SAR-001");

    db.billing().cancel(&bill.id).await.unwrap();
    assert_eq!(stock_of(&db, &shirt).await, 5);
}

#[tokio::test]
async fn deleting_an_item_keeps_its_movements() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;

    let bill = sell(&db, &staff, &[(saree.as_str(), 2)], PaymentMode::Cash).await;
    db.items().delete(&saree).await.unwrap();

    let sold = movements_for(&db, ReferenceType::Bill, &bill.id).await;
    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].quantity, -2);
    assert!(sold[0].item_id.is_none());

    // opening stock and the sale are both still on file
    let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stock_movements WHERE item_id IS NULL")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 2);
}

// =============================================================================
// Totals
// =============================================================================

#[tokio::test]
async fn finalize_ignores_stale_totals() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;

    let billing = db.billing();
    let draft = billing.create_draft(&staff, None).await.unwrap();
    let bill = billing.add_line(&draft.id, &saree, 2, Percent::from_whole(10)).await.unwrap();

    let totals = billing.recompute_totals(&draft.id, Percent::zero(), false).await.unwrap();
    assert_eq!(totals.grand_total, Money::from_rupees(1890));
    assert_eq!(totals.cgst, Money::from_rupees(45));
    assert_eq!(totals.sgst, Money::from_rupees(45));

    // edit without recompute: stored totals are now stale
    let line_id = bill.lines[0].id.clone();
    billing.update_line(&draft.id, &line_id, 3, Percent::from_whole(10)).await.unwrap();
    let stale = billing.get_bill(&draft.id).await.unwrap();
    assert_eq!(stale.totals.grand_total, Money::from_rupees(1890));

    let finalized = billing.finalize(&draft.id, PaymentMode::Cash).await.unwrap();
    assert_eq!(finalized.totals.subtotal, Money::from_rupees(2700));
    assert_eq!(finalized.totals.total_gst, Money::from_rupees(135));
    assert_eq!(finalized.totals.grand_total, Money::from_rupees(2835));

    let stored = billing.get_bill(&draft.id).await.unwrap();
    assert_eq!(stored.totals, finalized.totals);
    assert_eq!(stock_of(&db, &saree).await, 7);
}

/// Item priced in paise, for totals that do not land on whole rupees.
async fn add_item_paise(db: &Database, barcode: &str, paise: i64, gst_whole: i64) -> String {
    db.items()
        .insert(
            NewItem {
                barcode: Some(barcode.to_string()),
                name: format!("Fabric {}", barcode),
                hsn_code: None,
                category: None,
                price: Money::from_paise(paise),
                gst_rate: Percent::from_whole(gst_whole),
                stock_quantity: 10,
            },
            None,
        )
        .await
        .unwrap()
        .id
}

fn assert_totals_add_up(totals: &tsk_core::BillTotals) {
    assert_eq!(
        totals.subtotal - totals.discount_amount + totals.total_gst + totals.round_off,
        totals.grand_total
    );
    assert_eq!(totals.cgst + totals.sgst + totals.igst, totals.total_gst);
}

#[tokio::test]
async fn reloaded_totals_still_add_up() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    // ₹105.10 at 5% with 2.5% off the bill
    let lawn = add_item_paise(&db, "LWN-001", 10_510, 5).await;
    // ₹105.03 at 5%: each half of the tax rounds up
    let voile = add_item_paise(&db, "VOI-002", 10_503, 5).await;

    let billing = db.billing();

    let first = billing.create_draft(&staff, None).await.unwrap();
    billing.add_line(&first.id, &lawn, 1, Percent::zero()).await.unwrap();
    billing.recompute_totals(&first.id, Percent::from_bps(250), false).await.unwrap();
    let finalized = billing.finalize(&first.id, PaymentMode::Cash).await.unwrap();

    let stored = billing.get_bill(&first.id).await.unwrap();
    assert_eq!(stored.totals, finalized.totals);
    assert_eq!(stored.totals.discount_amount, Money::from_paise(263));
    assert_eq!(stored.totals.total_gst, Money::from_paise(512));
    assert_eq!(stored.totals.grand_total, Money::from_rupees(108));
    assert_totals_add_up(&stored.totals);

    let second = billing.create_draft(&staff, None).await.unwrap();
    billing.add_line(&second.id, &voile, 1, Percent::zero()).await.unwrap();
    let totals = billing.recompute_totals(&second.id, Percent::zero(), false).await.unwrap();

    let stored = billing.get_bill(&second.id).await.unwrap();
    assert_eq!(stored.totals, totals);
    assert_eq!(stored.totals.cgst, Money::from_paise(263));
    assert_eq!(stored.totals.total_gst, Money::from_paise(526));
    assert_totals_add_up(&stored.totals);

    // stored line columns add up the same way
    let (line_total, taxable, gst): (i64, i64, i64) = sqlx::query_as(
        "SELECT line_total_paise, taxable_paise, cgst_paise + sgst_paise + igst_paise \
         FROM bill_items WHERE bill_id = ?1",
    )
    .bind(&second.id)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(line_total, taxable + gst);
}

#[tokio::test]
async fn bill_discount_and_interstate_are_persisted() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;
    let shirt = add_item(&db, "SHT-002", 1000, 12, 10).await;

    let billing = db.billing();
    let draft = billing.create_draft(&staff, None).await.unwrap();
    billing.add_line(&draft.id, &saree, 1, Percent::zero()).await.unwrap();
    billing.add_line(&draft.id, &shirt, 1, Percent::zero()).await.unwrap();

    // tax 50 + 120 scaled by 1800 / 2000
    let totals = billing.recompute_totals(&draft.id, Percent::from_whole(10), true).await.unwrap();
    assert_eq!(totals.subtotal, Money::from_rupees(2000));
    assert_eq!(totals.discount_amount, Money::from_rupees(200));
    assert_eq!(totals.total_gst, Money::from_rupees(153));
    assert_eq!(totals.igst, Money::from_rupees(153));
    assert!(totals.cgst.is_zero());
    assert_eq!(totals.grand_total, Money::from_rupees(1953));

    let finalized = billing.finalize(&draft.id, PaymentMode::Upi).await.unwrap();
    assert!(finalized.is_interstate);
    assert_eq!(finalized.bill_discount, Percent::from_whole(10));
    assert_eq!(finalized.totals, totals);
}

// =============================================================================
// Invoice Numbers
// =============================================================================

#[tokio::test]
async fn invoice_numbers_continue_from_the_highest_suffix() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;

    for _ in 0..7 {
        db.billing().create_draft(&staff, None).await.unwrap();
    }
    assert!(db.bills().get_by_invoice("TSK000007").await.unwrap().is_some());
    assert_eq!(db.sequencer().next_invoice_number("TSK").await.unwrap(), "TSK000008");

    let next = db.billing().create_draft(&staff, None).await.unwrap();
    assert_eq!(next.invoice_number, "TSK000008");

    // other prefixes have their own sequence
    assert_eq!(db.sequencer().next_invoice_number("INV").await.unwrap(), "INV000001");
}

#[tokio::test]
async fn prefix_setting_changes_new_invoices() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;

    db.settings().set("invoice_prefix", "SLK").await.unwrap();
    let draft = db.billing().create_draft(&staff, None).await.unwrap();
    assert_eq!(draft.invoice_number, "SLK000001");
}

#[tokio::test]
async fn corrupt_suffix_falls_back_to_timestamp() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;

    let first = db.billing().create_draft(&staff, None).await.unwrap();
    sqlx::query("UPDATE bills SET invoice_number = 'TSKABC' WHERE id = ?1")
        .bind(&first.id)
        .execute(db.pool())
        .await
        .unwrap();

    let fallback = db.billing().create_draft(&staff, None).await.unwrap();
    let suffix = fallback.invoice_number.strip_prefix("TSK").unwrap();
    assert_eq!(suffix.len(), 14);
    assert!(suffix.bytes().all(|b| b.is_ascii_digit()));
    assert!(suffix.starts_with("20"));
}

/// Makes inserts of matching invoice numbers fail the way a number taken
/// by another terminal does.
async fn reject_invoice_numbers(db: &Database, condition: &str) {
    let sql = format!(
        "CREATE TRIGGER taken_invoice BEFORE INSERT ON bills WHEN {} \
         BEGIN SELECT RAISE(ABORT, 'UNIQUE constraint failed: bills.invoice_number'); END",
        condition
    );
    sqlx::query(&sql).execute(db.pool()).await.unwrap();
}

async fn corrupt_first_invoice(db: &Database, staff: &str) {
    let first = db.billing().create_draft(staff, None).await.unwrap();
    sqlx::query("UPDATE bills SET invoice_number = 'TSKABC' WHERE id = ?1")
        .bind(&first.id)
        .execute(db.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn taken_invoice_number_is_retried() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    corrupt_first_invoice(&db, &staff).await;

    // the first fallback (TSK + 14 digits) is taken; the retry appends "01"
    reject_invoice_numbers(&db, "length(NEW.invoice_number) = 17").await;

    let draft = db.billing().create_draft(&staff, None).await.unwrap();
    let suffix = draft.invoice_number.strip_prefix("TSK").unwrap();
    assert_eq!(suffix.len(), 16);
    assert!(suffix.ends_with("01"));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bills")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn invoice_retries_give_up_after_the_limit() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    reject_invoice_numbers(&db, "NEW.invoice_number LIKE 'TSK%'").await;

    let err = db.billing().create_draft(&staff, None).await.unwrap_err();
    match err {
        DbError::Domain(CoreError::DuplicateInvoiceNumber { invoice_number, attempts }) => {
            assert_eq!(attempts, tsk_core::MAX_INVOICE_ATTEMPTS);
            assert_eq!(invoice_number, "TSK000001");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bills")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

// =============================================================================
// Reports
// =============================================================================

#[tokio::test]
async fn reports_count_only_finalized_bills() {
    let db = db().await;
    let anand = add_staff(&db, "Anand").await;
    let priya = add_staff(&db, "Priya").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 20).await;

    sell(&db, &anand, &[(saree.as_str(), 2)], PaymentMode::Cash).await;
    sell(&db, &priya, &[(saree.as_str(), 1)], PaymentMode::Upi).await;
    let cancelled = sell(&db, &priya, &[(saree.as_str(), 4)], PaymentMode::Upi).await;
    db.billing().cancel(&cancelled.id).await.unwrap();
    let draft = db.billing().create_draft(&anand, None).await.unwrap();
    db.billing().add_line(&draft.id, &saree, 1, Percent::zero()).await.unwrap();

    let today = DateRange::today();
    let reports = db.reports();

    let summary = reports.sales_summary(today).await.unwrap();
    assert_eq!(summary.bill_count, 2);
    assert_eq!(summary.total_sales, Money::from_rupees(3150));
    assert_eq!(summary.total_gst, Money::from_rupees(150));
    assert_eq!(summary.average_bill, Money::from_rupees(1575));

    let gst = reports.gst_summary(today).await.unwrap();
    assert_eq!(gst.taxable_value, Money::from_rupees(3000));
    assert_eq!(gst.cgst, Money::from_rupees(75));
    assert_eq!(gst.sgst, Money::from_rupees(75));
    assert!(gst.igst.is_zero());

    let payments = reports.payment_breakdown(today).await.unwrap();
    assert_eq!(payments.len(), 2);
    let upi = payments.iter().find(|p| p.payment_mode == PaymentMode::Upi).unwrap();
    assert_eq!(upi.bill_count, 1);
    assert_eq!(upi.amount, Money::from_rupees(1050));

    let staff = reports.staff_performance(today).await.unwrap();
    assert_eq!(staff[0].staff_name, "Anand");
    assert_eq!(staff[0].items_sold, 2);
    assert_eq!(staff[1].staff_name, "Priya");
    assert_eq!(staff[1].bill_count, 1);

    let all = reports.bills_between(today, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let only_priya = reports.bills_between(today, Some(&priya)).await.unwrap();
    assert_eq!(only_priya.len(), 1);
    assert_eq!(only_priya[0].item_count, 1);
}

#[tokio::test]
async fn bill_listing_names_the_customer() {
    let db = db().await;
    let staff = add_staff(&db, "Anand").await;
    let saree = add_item(&db, "SAR-001", 1000, 5, 10).await;
    let meena = db.customers().insert("Meena", Some("9876543210"), None).await.unwrap();

    let billing = db.billing();
    let draft = billing.create_draft(&staff, Some(&meena.id)).await.unwrap();
    billing.add_line(&draft.id, &saree, 1, Percent::zero()).await.unwrap();
    billing.finalize(&draft.id, PaymentMode::Card).await.unwrap();
    sell(&db, &staff, &[(saree.as_str(), 1)], PaymentMode::Cash).await;

    let bills = db.reports().bills_between(DateRange::today(), None).await.unwrap();
    assert_eq!(bills.len(), 2);
    assert_eq!(bills[0].customer_name.as_deref(), Some("Meena"));
    assert!(bills[1].customer_name.is_none());
}

#[tokio::test]
async fn low_stock_uses_threshold_setting() {
    let db = db().await;
    add_item(&db, "SAR-001", 1000, 5, 3).await;
    add_item(&db, "SHT-002", 600, 12, 8).await;
    let gone = add_item(&db, "DHT-003", 400, 5, 0).await;
    db.items().deactivate(&gone).await.unwrap();

    let low = db.reports().low_stock(None).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].stock_quantity, 3);

    db.settings().set("low_stock_threshold", "10").await.unwrap();
    assert_eq!(db.reports().low_stock(None).await.unwrap().len(), 2);
    assert!(db.reports().low_stock(Some(0)).await.unwrap().is_empty());
}

// =============================================================================
// Backups
// =============================================================================

#[tokio::test]
async fn backup_copies_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(DbConfig::new(dir.path().join("tsk.db"))).await.unwrap();
    add_staff(&db, "Anand").await;

    let target = dir.path().join("backups").join("tsk-2026-10-17.db");
    let record = db.backup_to(&target).await.unwrap();
    assert!(target.exists());
    assert_eq!(record.path, target.display().to_string());

    let err = db.backup_to(&target).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }));
    assert_eq!(db.backup_history(10).await.unwrap().len(), 1);

    let copy = Database::new(DbConfig::new(&target)).await.unwrap();
    assert!(copy.staff().get_by_name("anand").await.unwrap().is_some());
}
