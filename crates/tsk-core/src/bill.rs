//! # Bill Aggregate
//!
//! The in-memory bill: its lines, its totals and its status transitions.
//! Persistence and stock movements are driven from `tsk-db::billing`; every
//! rule about what a bill may do lives here.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   add_line / update_line / remove_line / recompute_totals              │
//! │          ┌────────┐                                                     │
//! │          ▼        │                                                     │
//! │      ┌───────┐────┘  finalize   ┌───────────┐  cancel  ┌───────────┐   │
//! │      │ DRAFT │ ───────────────► │ FINALIZED │ ───────► │ CANCELLED │   │
//! │      └───────┘                  └───────────┘          └───────────┘   │
//! │          │                                                              │
//! │          └── discard (deleted, never touched stock)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Pipeline
//! ```text
//! lines ──compute_line──► Σ taxable = subtotal, Σ gst = pre-discount tax
//!                              │
//!             bill discount %  ▼
//!         discounted = subtotal − subtotal × d%
//!         tax        = pre-discount tax × discounted / subtotal
//!                              │
//!                              ▼
//!         raw = discounted + tax ──round half-even──► grand_total
//!         round_off = grand_total − raw
//! ```
//!
//! Line mutations do NOT recompute the bill totals. Callers batch their edits
//! and call [`Bill::recompute_totals`] once; [`Bill::finalize`] always
//! recomputes, so stale totals never reach a finalized bill.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::gst::{compute_line, LineCalc, TaxSplit};
use crate::money::{Money, Percent};
use crate::types::{BillStatus, ItemSnapshot, PaymentMode};
use crate::validation::{validate_bill_discount, validate_line_count, validate_quantity};

// =============================================================================
// Bill Line
// =============================================================================

/// One line of a bill.
///
/// Name, barcode, price and GST rate are frozen when the line is added.
/// `item_id` becomes `None` if the catalog item is later deleted; the
/// snapshot keeps the invoice readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillLine {
    pub id: String,
    pub item_id: Option<String>,
    pub item_name: String,
    pub barcode: Option<String>,
    #[ts(type = "string")]
    pub unit_price: Money,
    #[ts(type = "number")]
    pub gst_rate: Percent,
    pub quantity: i64,
    #[ts(type = "number")]
    pub discount: Percent,
    /// Derived amounts, refreshed by every recompute.
    pub calc: LineCalc,
}

impl BillLine {
    /// Recomputes `calc` from the line inputs.
    pub fn recalculate(&mut self, is_interstate: bool) -> CoreResult<&LineCalc> {
        self.calc = compute_line(
            self.quantity,
            self.unit_price,
            self.discount,
            self.gst_rate,
            is_interstate,
        )?;
        Ok(&self.calc)
    }
}

// =============================================================================
// Bill Totals
// =============================================================================

/// Aggregate amounts of a bill.
///
/// `grand_total` is always whole rupees; `round_off` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillTotals {
    /// Σ line taxable amounts, before the bill discount.
    #[ts(type = "string")]
    pub subtotal: Money,
    /// Bill-level discount on the subtotal.
    #[ts(type = "string")]
    pub discount_amount: Money,
    #[ts(type = "string")]
    pub cgst: Money,
    #[ts(type = "string")]
    pub sgst: Money,
    #[ts(type = "string")]
    pub igst: Money,
    #[ts(type = "string")]
    pub total_gst: Money,
    #[ts(type = "string")]
    pub round_off: Money,
    #[ts(type = "string")]
    pub grand_total: Money,
}

impl BillTotals {
    /// Aggregates already computed lines.
    ///
    /// ## Discount Scaling
    /// With a bill discount the tax is not recomputed on the discounted
    /// subtotal. The pre-discount tax is scaled by `discounted / subtotal`,
    /// which keeps the effective rate mix of lines at different GST slabs.
    /// A zero subtotal scales to zero.
    pub fn from_lines<'a>(
        lines: impl IntoIterator<Item = &'a LineCalc>,
        bill_discount: Percent,
        is_interstate: bool,
    ) -> BillTotals {
        let (subtotal, pre_discount_tax) = lines
            .into_iter()
            .fold((Money::zero(), Money::zero()), |(taxable, tax), line| {
                (taxable + line.taxable_amount, tax + line.tax.total_gst)
            });

        let discount_amount = subtotal.percent_of(bill_discount);
        let discounted = subtotal - discount_amount;

        let total_gst = if bill_discount.is_positive() {
            pre_discount_tax.scale(discounted, subtotal)
        } else {
            pre_discount_tax
        };
        let tax = TaxSplit::split(total_gst, is_interstate);

        let raw = discounted + tax.total_gst;
        let grand_total = raw.round_to_rupee();

        BillTotals {
            subtotal,
            discount_amount,
            cgst: tax.cgst,
            sgst: tax.sgst,
            igst: tax.igst,
            total_gst: tax.total_gst,
            round_off: grand_total - raw,
            grand_total,
        }
    }

    /// The totals as stored, in whole paise.
    ///
    /// Tax components are rounded one by one and summed into `total_gst`;
    /// `round_off` takes up the rest. After settling both
    /// `cgst + sgst + igst = total_gst` and
    /// `subtotal − discount_amount + total_gst + round_off = grand_total`
    /// hold exactly.
    pub fn settled(&self) -> BillTotals {
        let subtotal = self.subtotal.round_to_paise();
        let discount_amount = self.discount_amount.round_to_paise();
        let tax = TaxSplit {
            cgst: self.cgst,
            sgst: self.sgst,
            igst: self.igst,
            total_gst: self.total_gst,
        }
        .settled();
        let grand_total = self.grand_total.round_to_paise();

        BillTotals {
            subtotal,
            discount_amount,
            cgst: tax.cgst,
            sgst: tax.sgst,
            igst: tax.igst,
            total_gst: tax.total_gst,
            round_off: grand_total - (subtotal - discount_amount + tax.total_gst),
            grand_total,
        }
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A bill and its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Bill {
    pub id: String,
    pub invoice_number: String,
    pub staff_id: String,
    /// `None` for a walk-in sale.
    pub customer_id: Option<String>,
    pub status: BillStatus,
    /// Set at finalize.
    pub payment_mode: Option<PaymentMode>,
    #[ts(type = "number")]
    pub bill_discount: Percent,
    pub is_interstate: bool,
    pub lines: Vec<BillLine>,
    pub totals: BillTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub finalized_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Bill {
    /// Creates an empty draft with zeroed totals.
    pub fn new_draft(invoice_number: impl Into<String>, staff_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Bill {
            id: Uuid::new_v4().to_string(),
            invoice_number: invoice_number.into(),
            staff_id: staff_id.into(),
            customer_id: None,
            status: BillStatus::Draft,
            payment_mode: None,
            bill_discount: Percent::zero(),
            is_interstate: false,
            lines: Vec::new(),
            totals: BillTotals::default(),
            created_at: now,
            updated_at: now,
            finalized_at: None,
            cancelled_at: None,
        }
    }

    /// Rejects the operation unless the bill is still a draft.
    pub fn ensure_draft(&self, operation: &str) -> CoreResult<()> {
        if self.status != BillStatus::Draft {
            return Err(CoreError::invalid_status(&self.id, self.status, operation));
        }
        Ok(())
    }

    /// Total quantity already on the bill for an item.
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.item_id.as_deref() == Some(item_id))
            .map(|line| line.quantity)
            .sum()
    }

    pub fn line(&self, line_id: &str) -> CoreResult<&BillLine> {
        self.lines
            .iter()
            .find(|line| line.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound {
                bill_id: self.id.clone(),
                line_id: line_id.to_string(),
            })
    }

    fn line_mut(&mut self, line_id: &str) -> CoreResult<&mut BillLine> {
        let bill_id = self.id.clone();
        self.lines
            .iter_mut()
            .find(|line| line.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound {
                bill_id,
                line_id: line_id.to_string(),
            })
    }

    /// Adds `quantity` of an item.
    ///
    /// If the item is already on the bill its line quantity grows instead;
    /// the existing line keeps its price and discount. The cumulative
    /// quantity is checked against the snapshot's stock (read-only; nothing
    /// is deducted until finalize).
    ///
    /// Returns the id of the new or grown line.
    pub fn add_line(
        &mut self,
        item: &ItemSnapshot,
        quantity: i64,
        discount: Percent,
    ) -> CoreResult<String> {
        self.ensure_draft("add lines")?;
        validate_quantity(quantity)?;

        if !item.is_active {
            return Err(CoreError::ItemInactive(item.name.clone()));
        }

        let requested = self.quantity_of(&item.item_id) + quantity;
        if requested > item.stock_quantity {
            return Err(CoreError::InsufficientStock {
                item: item.name.clone(),
                available: item.stock_quantity,
                requested,
            });
        }

        let is_interstate = self.is_interstate;
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.item_id.as_deref() == Some(item.item_id.as_str()))
        {
            let mut grown = line.clone();
            grown.quantity += quantity;
            grown.recalculate(is_interstate)?;
            *line = grown;
            self.updated_at = Utc::now();
            return Ok(line.id.clone());
        }

        validate_line_count(self.lines.len())?;

        let mut line = BillLine {
            id: Uuid::new_v4().to_string(),
            item_id: Some(item.item_id.clone()),
            item_name: item.name.clone(),
            barcode: item.barcode.clone(),
            unit_price: item.unit_price,
            gst_rate: item.gst_rate,
            quantity,
            discount,
            calc: LineCalc::default(),
        };
        line.recalculate(is_interstate)?;

        let id = line.id.clone();
        self.lines.push(line);
        self.updated_at = Utc::now();
        Ok(id)
    }

    /// Changes a line's quantity and discount.
    ///
    /// `available_stock` is the item's current stock when the line still
    /// references a catalog item. Bill totals are left stale.
    pub fn update_line(
        &mut self,
        line_id: &str,
        quantity: i64,
        discount: Percent,
        available_stock: Option<i64>,
    ) -> CoreResult<()> {
        self.ensure_draft("update lines")?;
        let is_interstate = self.is_interstate;

        let line = self.line_mut(line_id)?;
        if let Some(available) = available_stock {
            if quantity > available {
                return Err(CoreError::InsufficientStock {
                    item: line.item_name.clone(),
                    available,
                    requested: quantity,
                });
            }
        }

        let mut updated = line.clone();
        updated.quantity = quantity;
        updated.discount = discount;
        updated.recalculate(is_interstate)?;
        *line = updated;

        self.updated_at = Utc::now();
        Ok(())
    }

    /// Removes a line. Bill totals are left stale.
    pub fn remove_line(&mut self, line_id: &str) -> CoreResult<BillLine> {
        self.ensure_draft("remove lines")?;
        let index = self
            .lines
            .iter()
            .position(|line| line.id == line_id)
            .ok_or_else(|| CoreError::LineNotFound {
                bill_id: self.id.clone(),
                line_id: line_id.to_string(),
            })?;

        self.updated_at = Utc::now();
        Ok(self.lines.remove(index))
    }

    /// Recomputes every line from its inputs and rebuilds the totals.
    ///
    /// Stored line amounts are never reused. Calling this twice with the same
    /// inputs yields identical totals.
    pub fn recompute_totals(
        &mut self,
        bill_discount: Percent,
        is_interstate: bool,
    ) -> CoreResult<BillTotals> {
        self.ensure_draft("recompute totals")?;
        validate_bill_discount(bill_discount)?;

        for line in &mut self.lines {
            line.recalculate(is_interstate)?;
        }

        self.bill_discount = bill_discount;
        self.is_interstate = is_interstate;
        self.totals = BillTotals::from_lines(
            self.lines.iter().map(|line| &line.calc),
            bill_discount,
            is_interstate,
        );
        self.updated_at = Utc::now();

        Ok(self.totals)
    }

    /// Checks finalize preconditions: a draft with at least one line.
    pub fn ensure_can_finalize(&self) -> CoreResult<()> {
        self.ensure_draft("finalize")?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyBill(self.id.clone()));
        }
        Ok(())
    }

    /// Locks the bill with fresh totals from its stored discount settings.
    pub fn finalize(&mut self, payment_mode: PaymentMode) -> CoreResult<BillTotals> {
        self.ensure_can_finalize()?;
        let totals = self.recompute_totals(self.bill_discount, self.is_interstate)?;

        let now = Utc::now();
        self.status = BillStatus::Finalized;
        self.payment_mode = Some(payment_mode);
        self.finalized_at = Some(now);
        self.updated_at = now;

        Ok(totals)
    }

    /// Marks a finalized bill as cancelled. Drafts are discarded instead.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if self.status != BillStatus::Finalized {
            return Err(CoreError::invalid_status(&self.id, self.status, "cancel"));
        }

        let now = Utc::now();
        self.status = BillStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn snapshot(id: &str, price_paise: i64, gst: i64, stock: i64) -> ItemSnapshot {
        ItemSnapshot {
            item_id: id.to_string(),
            name: format!("Item {}", id),
            barcode: None,
            unit_price: Money::from_paise(price_paise),
            gst_rate: Percent::from_whole(gst),
            stock_quantity: stock,
            is_active: true,
        }
    }

    fn draft() -> Bill {
        Bill::new_draft("TSK000001", "staff-1")
    }

    #[test]
    fn test_new_draft_is_empty() {
        let bill = draft();
        assert_eq!(bill.status, BillStatus::Draft);
        assert!(bill.lines.is_empty());
        assert_eq!(bill.totals, BillTotals::default());
        assert!(bill.payment_mode.is_none());
    }

    #[test]
    fn test_bill_discount_scales_tax() {
        // Two lines of ₹1000 with 10% line discount at 5%: subtotal 1800, tax 90
        let mut bill = draft();
        bill.add_line(&snapshot("a", 100_000, 5, 10), 1, Percent::from_whole(10))
            .unwrap();
        bill.add_line(&snapshot("b", 100_000, 5, 10), 1, Percent::from_whole(10))
            .unwrap();

        let totals = bill.recompute_totals(Percent::from_whole(10), false).unwrap();

        assert_eq!(totals.subtotal, Money::from_rupees(1800));
        assert_eq!(totals.discount_amount, Money::from_rupees(180));
        assert_eq!(totals.total_gst, Money::from_rupees(81));
        assert_eq!(totals.cgst, totals.sgst);
        assert_eq!(totals.grand_total, Money::from_rupees(1701));
        assert!(totals.round_off.is_zero());
    }

    #[test]
    fn test_mixed_slabs_keep_rate_mix() {
        // 5% on ₹1000 and 12% on ₹1000, 20% bill discount
        let mut bill = draft();
        bill.add_line(&snapshot("a", 100_000, 5, 5), 1, Percent::zero()).unwrap();
        bill.add_line(&snapshot("b", 100_000, 12, 5), 1, Percent::zero()).unwrap();

        let totals = bill.recompute_totals(Percent::from_whole(20), true).unwrap();

        // (50 + 120) × 1600 / 2000 = 136
        assert_eq!(totals.total_gst, Money::from_rupees(136));
        assert_eq!(totals.igst, Money::from_rupees(136));
        assert_eq!(totals.grand_total, Money::from_rupees(1736));
    }

    #[test]
    fn test_grand_total_ties_round_to_even() {
        let mut bill = draft();
        bill.add_line(&snapshot("a", 170_050, 0, 1), 1, Percent::zero()).unwrap();
        let totals = bill.recompute_totals(Percent::zero(), false).unwrap();
        assert_eq!(totals.grand_total, Money::from_rupees(1700));
        assert_eq!(totals.round_off, Money::from_paise(-50));

        let mut bill = draft();
        bill.add_line(&snapshot("a", 170_150, 0, 1), 1, Percent::zero()).unwrap();
        let totals = bill.recompute_totals(Percent::zero(), false).unwrap();
        assert_eq!(totals.grand_total, Money::from_rupees(1702));
        assert_eq!(totals.round_off, Money::from_paise(50));
    }

    #[test]
    fn test_round_off_closes_the_gap() {
        let mut bill = draft();
        bill.add_line(&snapshot("a", 33_333, 5, 9), 3, Percent::from_whole(7))
            .unwrap();
        let totals = bill.recompute_totals(Percent::from_bps(250), false).unwrap();

        let raw = totals.subtotal - totals.discount_amount + totals.total_gst;
        assert_eq!(totals.grand_total, raw + totals.round_off);
        assert!(totals.grand_total.is_whole_rupees());
        assert!(totals.round_off.amount().abs() <= Decimal::from_str("0.5").unwrap());
    }

    #[test]
    fn test_settled_totals_keep_both_identities() {
        // ₹105.10 at 5% with 2.5% off the bill: discount ₹2.6275, tax ₹5.1236…
        let mut bill = draft();
        bill.add_line(&snapshot("a", 10_510, 5, 3), 1, Percent::zero()).unwrap();
        let totals = bill
            .recompute_totals(Percent::from_bps(250), false)
            .unwrap()
            .settled();

        assert_eq!(totals.subtotal, Money::from_paise(10_510));
        assert_eq!(totals.discount_amount, Money::from_paise(263));
        assert_eq!(totals.total_gst, Money::from_paise(512));
        assert_eq!(totals.grand_total, Money::from_rupees(108));
        assert_eq!(totals.round_off, Money::from_paise(41));
        assert_eq!(
            totals.subtotal - totals.discount_amount + totals.total_gst + totals.round_off,
            totals.grand_total
        );
        assert_eq!(totals.cgst + totals.sgst + totals.igst, totals.total_gst);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut bill = draft();
        bill.add_line(&snapshot("a", 33_333, 5, 9), 3, Percent::from_whole(7))
            .unwrap();
        bill.add_line(&snapshot("b", 129_900, 12, 9), 2, Percent::zero())
            .unwrap();

        let first = bill.recompute_totals(Percent::from_whole(3), false).unwrap();
        let second = bill.recompute_totals(Percent::from_whole(3), false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_subtotal_scales_to_zero() {
        let mut bill = draft();
        bill.add_line(&snapshot("a", 0, 5, 3), 1, Percent::zero()).unwrap();
        let totals = bill.recompute_totals(Percent::from_whole(10), false).unwrap();
        assert!(totals.total_gst.is_zero());
        assert!(totals.grand_total.is_zero());
    }

    #[test]
    fn test_same_item_combines() {
        let mut bill = draft();
        let item = snapshot("a", 50_000, 5, 5);
        let first = bill.add_line(&item, 2, Percent::zero()).unwrap();
        let second = bill.add_line(&item, 3, Percent::from_whole(50)).unwrap();

        assert_eq!(first, second);
        assert_eq!(bill.lines.len(), 1);
        assert_eq!(bill.lines[0].quantity, 5);
        assert!(bill.lines[0].discount.is_zero());
        assert_eq!(bill.lines[0].calc.taxable_amount, Money::from_rupees(2500));
    }

    #[test]
    fn test_cumulative_quantity_checked_against_stock() {
        let mut bill = draft();
        let item = snapshot("a", 50_000, 5, 5);
        bill.add_line(&item, 4, Percent::zero()).unwrap();

        let err = bill.add_line(&item, 2, Percent::zero()).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                item: "Item a".to_string(),
                available: 5,
                requested: 6,
            }
        );
        assert_eq!(bill.lines[0].quantity, 4);
    }

    #[test]
    fn test_inactive_item_rejected() {
        let mut bill = draft();
        let mut item = snapshot("a", 50_000, 5, 5);
        item.is_active = false;
        assert!(matches!(
            bill.add_line(&item, 1, Percent::zero()),
            Err(CoreError::ItemInactive(_))
        ));
    }

    #[test]
    fn test_invalid_line_leaves_bill_untouched() {
        let mut bill = draft();
        let item = snapshot("a", 50_000, 5, 5);
        assert!(bill.add_line(&item, 1, Percent::from_whole(120)).is_err());
        assert!(bill.lines.is_empty());
        assert!(bill.add_line(&item, 0, Percent::zero()).is_err());
        assert!(bill.lines.is_empty());
    }

    #[test]
    fn test_mutations_leave_totals_stale_until_recompute() {
        let mut bill = draft();
        let line_id = bill
            .add_line(&snapshot("a", 100_000, 5, 10), 1, Percent::zero())
            .unwrap();
        bill.recompute_totals(Percent::zero(), false).unwrap();
        assert_eq!(bill.totals.grand_total, Money::from_rupees(1050));

        bill.update_line(&line_id, 2, Percent::zero(), Some(10)).unwrap();
        assert_eq!(bill.totals.grand_total, Money::from_rupees(1050));

        bill.recompute_totals(Percent::zero(), false).unwrap();
        assert_eq!(bill.totals.grand_total, Money::from_rupees(2100));

        bill.remove_line(&line_id).unwrap();
        assert_eq!(bill.totals.grand_total, Money::from_rupees(2100));
        assert!(bill.ensure_can_finalize().is_err());
    }

    #[test]
    fn test_update_line_checks_stock_and_existence() {
        let mut bill = draft();
        let line_id = bill
            .add_line(&snapshot("a", 100_000, 5, 3), 1, Percent::zero())
            .unwrap();

        assert!(matches!(
            bill.update_line(&line_id, 4, Percent::zero(), Some(3)),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert!(matches!(
            bill.update_line("missing", 1, Percent::zero(), None),
            Err(CoreError::LineNotFound { .. })
        ));
        assert_eq!(bill.lines[0].quantity, 1);
    }

    #[test]
    fn test_finalize_recomputes_stale_totals() {
        let mut bill = draft();
        bill.add_line(&snapshot("a", 100_000, 5, 10), 2, Percent::from_whole(10))
            .unwrap();
        bill.bill_discount = Percent::from_whole(10);
        bill.totals.grand_total = Money::from_rupees(1);

        let totals = bill.finalize(PaymentMode::Upi).unwrap();

        assert_eq!(totals.grand_total, Money::from_rupees(1701));
        assert_eq!(bill.status, BillStatus::Finalized);
        assert_eq!(bill.payment_mode, Some(PaymentMode::Upi));
        assert!(bill.finalized_at.is_some());
    }

    #[test]
    fn test_status_transitions() {
        let mut bill = draft();
        assert!(matches!(bill.finalize(PaymentMode::Cash), Err(CoreError::EmptyBill(_))));
        assert!(matches!(bill.cancel(), Err(CoreError::InvalidBillStatus { .. })));

        bill.add_line(&snapshot("a", 10_000, 5, 1), 1, Percent::zero()).unwrap();
        bill.finalize(PaymentMode::Cash).unwrap();

        assert!(matches!(
            bill.finalize(PaymentMode::Cash),
            Err(CoreError::InvalidBillStatus { .. })
        ));
        assert!(bill.add_line(&snapshot("b", 10_000, 5, 1), 1, Percent::zero()).is_err());

        bill.cancel().unwrap();
        assert_eq!(bill.status, BillStatus::Cancelled);
        assert!(bill.cancelled_at.is_some());
        assert!(bill.cancel().is_err());
    }
}
