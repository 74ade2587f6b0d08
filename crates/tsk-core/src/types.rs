//! # Domain Types
//!
//! Catalog, staff and ledger types used throughout TSK Billing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │      Staff      │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  item_id        │       │
//! │  │  barcode        │   │  name (unique)  │   │  quantity (±)   │       │
//! │  │  price (Money)  │   │  is_active      │   │  movement_type  │       │
//! │  │  gst_rate       │   └─────────────────┘   │  reference_type │       │
//! │  │  stock_quantity │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   BillStatus    │   │   PaymentMode   │   │  MovementType   │       │
//! │  │  DRAFT          │   │  CASH           │   │  IN             │       │
//! │  │  FINALIZED      │   │  CARD           │   │  OUT            │       │
//! │  │  CANCELLED      │   │  UPI            │   │  ADJUSTMENT     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (barcode, invoice_number, staff name) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Percent};

// =============================================================================
// Item
// =============================================================================

/// A catalog item (saree, suiting, dress material...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Barcode printed on the sticker, unique when present.
    pub barcode: Option<String>,

    /// Display name shown at the counter and on the invoice.
    pub name: String,

    /// HSN code for GST returns (5007, 5208, 6206...).
    pub hsn_code: Option<String>,

    /// Free-form category ("Sarees", "Shirting").
    pub category: Option<String>,

    /// Selling price per unit.
    #[ts(type = "string")]
    pub price: Money,

    /// GST slab (0%, 5%, 12%, 18%, 28%).
    #[ts(type = "number")]
    pub gst_rate: Percent,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    /// Whether item can be billed (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Freezes the fields a bill line copies from the catalog.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item_id: self.id.clone(),
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            unit_price: self.price,
            gst_rate: self.gst_rate,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
        }
    }

    /// Checks if `quantity` units can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.stock_quantity >= quantity
    }
}

/// What a bill needs from the catalog at the moment a line is added.
///
/// Uses the snapshot pattern: name, barcode, price and GST rate are frozen
/// on the line so later catalog edits do not rewrite past invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub name: String,
    pub barcode: Option<String>,
    #[ts(type = "string")]
    pub unit_price: Money,
    #[ts(type = "number")]
    pub gst_rate: Percent,
    /// Stock on hand when the snapshot was taken (read-only check).
    pub stock_quantity: i64,
    pub is_active: bool,
}

// =============================================================================
// Staff
// =============================================================================

/// A counter staff member who opens bills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Customer / Category
// =============================================================================

/// A customer a bill can be issued to. Bills without one are walk-in sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// 10-digit mobile number, unique when present.
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A catalog category and how many items use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub item_count: i64,
}

// =============================================================================
// Bill Status
// =============================================================================

/// The lifecycle state of a bill.
///
/// ```text
/// DRAFT ──finalize──► FINALIZED ──cancel──► CANCELLED
///   │
///   └──discard──► (deleted, no stock effect)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    /// Lines are being added; stock not yet committed.
    Draft,
    /// Paid and locked; stock deducted.
    Finalized,
    /// Reversed after finalize; stock restored.
    Cancelled,
}

impl BillStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "DRAFT",
            BillStatus::Finalized => "FINALIZED",
            BillStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::Draft
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Mode
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Card,
    Upi,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 3] = [PaymentMode::Cash, PaymentMode::Card, PaymentMode::Upi];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::Upi => "UPI",
        }
    }
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Cash
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `cash`, `Card`, `UPI`.
impl FromStr for PaymentMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_mode".to_string(),
                allowed: PaymentMode::ALL
                    .iter()
                    .map(|mode| mode.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

/// What caused a stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    /// Stock the item was created with.
    OpeningStock,
    /// Sold on a finalized bill.
    Bill,
    /// Returned by cancelling a finalized bill.
    BillCancel,
    /// Manual correction after a physical count.
    StockAdjustment,
}

/// Provenance attached to every ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReference {
    pub reference_type: ReferenceType,
    pub reference_id: Option<String>,
    pub staff_id: Option<String>,
}

impl StockReference {
    pub fn opening_stock() -> Self {
        StockReference {
            reference_type: ReferenceType::OpeningStock,
            reference_id: None,
            staff_id: None,
        }
    }

    pub fn bill(bill_id: &str, staff_id: &str) -> Self {
        StockReference {
            reference_type: ReferenceType::Bill,
            reference_id: Some(bill_id.to_string()),
            staff_id: Some(staff_id.to_string()),
        }
    }

    pub fn bill_cancel(bill_id: &str, staff_id: &str) -> Self {
        StockReference {
            reference_type: ReferenceType::BillCancel,
            reference_id: Some(bill_id.to_string()),
            staff_id: Some(staff_id.to_string()),
        }
    }

    pub fn adjustment(staff_id: Option<&str>) -> Self {
        StockReference {
            reference_type: ReferenceType::StockAdjustment,
            reference_id: None,
            staff_id: staff_id.map(str::to_string),
        }
    }
}

/// One append-only ledger entry.
///
/// `quantity` is the signed delta: negative for OUT, positive for IN,
/// either sign for ADJUSTMENT. `item_id` is `None` once the item has been
/// hard-deleted; the entry itself is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub item_id: Option<String>,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reference_type: ReferenceType,
    pub reference_id: Option<String>,
    pub staff_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Builds a movement for a signed delta, deriving the movement type from
    /// the reference unless it is an adjustment.
    pub fn new(item_id: &str, delta: i64, reference: &StockReference, notes: Option<String>) -> Self {
        let movement_type = match reference.reference_type {
            ReferenceType::StockAdjustment => MovementType::Adjustment,
            _ if delta < 0 => MovementType::Out,
            _ => MovementType::In,
        };

        StockMovement {
            id: uuid::Uuid::new_v4().to_string(),
            item_id: Some(item_id.to_string()),
            quantity: delta,
            movement_type,
            reference_type: reference.reference_type,
            reference_id: reference.reference_id.clone(),
            staff_id: reference.staff_id.clone(),
            notes,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
