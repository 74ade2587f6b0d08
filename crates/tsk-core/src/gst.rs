//! # GST Calculator
//!
//! Stateless tax math for a single line.
//!
//! ## Intrastate vs Interstate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  taxable ₹1800 @ 5%  →  total GST ₹90                                   │
//! │                                                                         │
//! │  Intrastate (buyer in the same state)                                   │
//! │    CGST ₹45   +   SGST ₹45   IGST ₹0                                    │
//! │                                                                         │
//! │  Interstate (buyer in another state)                                    │
//! │    CGST ₹0        SGST ₹0    IGST ₹90                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here rounds. Sub-paise fractions are carried into the bill
//! totals, which round once.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::{Money, Percent};
use crate::validation::{validate_discount, validate_gst_rate, validate_quantity, validate_unit_price};

// =============================================================================
// Tax Split
// =============================================================================

/// GST on an amount, split by jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    #[ts(type = "string")]
    pub cgst: Money,
    #[ts(type = "string")]
    pub sgst: Money,
    #[ts(type = "string")]
    pub igst: Money,
    #[ts(type = "string")]
    pub total_gst: Money,
}

impl TaxSplit {
    /// Splits an already computed tax total.
    ///
    /// Interstate puts everything into IGST; intrastate halves it into CGST
    /// and SGST.
    pub fn split(total_gst: Money, is_interstate: bool) -> Self {
        if is_interstate {
            TaxSplit {
                cgst: Money::zero(),
                sgst: Money::zero(),
                igst: total_gst,
                total_gst,
            }
        } else {
            let half = total_gst.half();
            TaxSplit {
                cgst: half,
                sgst: half,
                igst: Money::zero(),
                total_gst,
            }
        }
    }

    /// Rounds each component to paise; `total_gst` becomes their sum.
    pub fn settled(&self) -> Self {
        let cgst = self.cgst.round_to_paise();
        let sgst = self.sgst.round_to_paise();
        let igst = self.igst.round_to_paise();
        TaxSplit {
            cgst,
            sgst,
            igst,
            total_gst: cgst + sgst + igst,
        }
    }
}

/// Computes GST on a taxable amount.
///
/// `total_gst = taxable × rate / 100`, then split per [`TaxSplit::split`].
pub fn compute_tax(taxable_amount: Money, gst_rate: Percent, is_interstate: bool) -> TaxSplit {
    TaxSplit::split(taxable_amount.percent_of(gst_rate), is_interstate)
}

// =============================================================================
// Line Calculation
// =============================================================================

/// Every derived amount of one bill line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineCalc {
    /// quantity × unit_price
    #[ts(type = "string")]
    pub line_amount: Money,
    #[ts(type = "string")]
    pub discount_amount: Money,
    /// line_amount − discount_amount
    #[ts(type = "string")]
    pub taxable_amount: Money,
    pub tax: TaxSplit,
    /// taxable_amount + tax.total_gst
    #[ts(type = "string")]
    pub line_total: Money,
}

impl LineCalc {
    /// The line as stored, in whole paise, with
    /// `line_total = taxable_amount + tax.total_gst` kept exact.
    pub fn settled(&self) -> Self {
        let taxable_amount = self.taxable_amount.round_to_paise();
        let tax = self.tax.settled();
        LineCalc {
            line_amount: self.line_amount.round_to_paise(),
            discount_amount: self.discount_amount.round_to_paise(),
            taxable_amount,
            tax,
            line_total: taxable_amount + tax.total_gst,
        }
    }
}

/// Computes a line from its inputs.
///
/// ## Flow
/// ```text
/// quantity × unit_price ──► line_amount
///                               │  − discount %
///                               ▼
///                         taxable_amount ──► compute_tax ──► TaxSplit
///                               │                               │
///                               └──────────── + ────────────────┘
///                                             ▼
///                                         line_total
/// ```
///
/// ## Errors
/// `ValidationError` when quantity ≤ 0, unit price < 0, discount outside
/// 0–100% or GST rate outside 0–28%.
///
/// ## Example
/// ```rust
/// use tsk_core::gst::compute_line;
/// use tsk_core::money::{Money, Percent};
///
/// let calc = compute_line(2, Money::from_rupees(1000), Percent::from_whole(10),
///                         Percent::from_whole(5), false).unwrap();
/// assert_eq!(calc.discount_amount, Money::from_rupees(200));
/// assert_eq!(calc.tax.cgst, Money::from_rupees(45));
/// ```
pub fn compute_line(
    quantity: i64,
    unit_price: Money,
    discount: Percent,
    gst_rate: Percent,
    is_interstate: bool,
) -> CoreResult<LineCalc> {
    validate_quantity(quantity)?;
    validate_unit_price(unit_price)?;
    validate_discount(discount)?;
    validate_gst_rate(gst_rate)?;

    let line_amount = unit_price * quantity;
    let discount_amount = line_amount.percent_of(discount);
    let taxable_amount = line_amount - discount_amount;
    let tax = compute_tax(taxable_amount, gst_rate, is_interstate);

    Ok(LineCalc {
        line_amount,
        discount_amount,
        taxable_amount,
        tax,
        line_total: taxable_amount + tax.total_gst,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
