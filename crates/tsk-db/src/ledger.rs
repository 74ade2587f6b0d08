//! # Inventory Ledger
//!
//! Stock changes with their audit trail.
//!
//! ## One Change, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve_and_deduct(item, 3, BILL)                                     │
//! │                                                                         │
//! │   BEGIN                                                                 │
//! │   UPDATE items SET stock_quantity = stock_quantity - 3                 │
//! │     WHERE id = ? AND stock_quantity >= 3      ← check + write together │
//! │   INSERT stock_movements (quantity = -3, OUT, BILL, bill_id)           │
//! │   COMMIT                                                                │
//! │                                                                         │
//! │  0 rows updated → InsufficientStock / ItemNotFound, nothing written    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQLite serializes writers, so two finalizes racing for the last unit
//! cannot both pass the `stock_quantity >= ?` guard.
//!
//! The free functions (`deduct`, `restore_in`, `set_absolute_in`) run inside
//! a caller's transaction; `BillingService` uses them to deduct every line
//! of a bill atomically. `InventoryLedger` wraps each in its own transaction.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use tsk_core::validation::{validate_quantity, validate_stock_quantity};
use tsk_core::{CoreError, MovementType, StockMovement, StockReference};

use crate::error::DbResult;
use crate::repository::{item, stock};

// =============================================================================
// In-Transaction Operations
// =============================================================================

/// Decrements stock by `quantity` and appends an OUT movement.
///
/// ## Errors
/// * `CoreError::ItemNotFound` - No such item
/// * `CoreError::InsufficientStock` - Fewer than `quantity` units on hand
pub async fn deduct(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    reference: &StockReference,
) -> DbResult<StockMovement> {
    validate_quantity(quantity)?;

    let result = sqlx::query(
        r#"
        UPDATE items
        SET stock_quantity = stock_quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND stock_quantity >= ?2
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(match item::fetch_item(conn, item_id).await? {
            None => CoreError::ItemNotFound(item_id.to_string()),
            Some(found) => {
                warn!(
                    item_id = %item_id,
                    available = found.stock_quantity,
                    requested = quantity,
                    "Insufficient stock"
                );
                CoreError::InsufficientStock {
                    item: found.name,
                    available: found.stock_quantity,
                    requested: quantity,
                }
            }
        }
        .into());
    }

    let movement = StockMovement::new(item_id, -quantity, reference, None);
    stock::append_movement(conn, &movement).await?;
    Ok(movement)
}

/// Increments stock by `quantity` and appends an IN movement. No upper bound.
pub async fn restore_in(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    reference: &StockReference,
) -> DbResult<StockMovement> {
    validate_quantity(quantity)?;

    let result = sqlx::query(
        "UPDATE items SET stock_quantity = stock_quantity + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(item_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ItemNotFound(item_id.to_string()).into());
    }

    let movement = StockMovement::new(item_id, quantity, reference, None);
    stock::append_movement(conn, &movement).await?;
    Ok(movement)
}

/// Sets stock to `new_quantity`, recording the signed delta as ADJUSTMENT.
///
/// Returns `None` when the stock already equals `new_quantity`.
pub async fn set_absolute_in(
    conn: &mut SqliteConnection,
    item_id: &str,
    new_quantity: i64,
    reference: &StockReference,
    notes: Option<String>,
) -> DbResult<Option<StockMovement>> {
    validate_stock_quantity(new_quantity)?;

    let current = item::fetch_stock(conn, item_id)
        .await?
        .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

    let delta = new_quantity - current;
    if delta == 0 {
        return Ok(None);
    }

    item::store_stock(conn, item_id, new_quantity).await?;

    let mut movement = StockMovement::new(item_id, delta, reference, notes);
    movement.movement_type = MovementType::Adjustment;
    stock::append_movement(conn, &movement).await?;
    Ok(Some(movement))
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Stock level compared with the sum of its movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub item_id: String,
    pub stock_quantity: i64,
    pub movement_total: i64,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.stock_quantity == self.movement_total
    }

    /// Units the stock column holds beyond what the ledger explains.
    pub fn drift(&self) -> i64 {
        self.stock_quantity - self.movement_total
    }
}

/// Standalone stock operations, one transaction each.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    pub async fn reserve_and_deduct(
        &self,
        item_id: &str,
        quantity: i64,
        reference: &StockReference,
    ) -> DbResult<StockMovement> {
        let mut tx = self.pool.begin().await?;
        let movement = deduct(&mut tx, item_id, quantity, reference).await?;
        tx.commit().await?;

        debug!(item_id = %item_id, quantity, "Stock deducted");
        Ok(movement)
    }

    pub async fn restore(
        &self,
        item_id: &str,
        quantity: i64,
        reference: &StockReference,
    ) -> DbResult<StockMovement> {
        let mut tx = self.pool.begin().await?;
        let movement = restore_in(&mut tx, item_id, quantity, reference).await?;
        tx.commit().await?;

        debug!(item_id = %item_id, quantity, "Stock restored");
        Ok(movement)
    }

    /// Stock count correction, e.g. after a physical count.
    pub async fn set_absolute(
        &self,
        item_id: &str,
        new_quantity: i64,
        reference: &StockReference,
        notes: Option<String>,
    ) -> DbResult<Option<StockMovement>> {
        let mut tx = self.pool.begin().await?;
        let movement = set_absolute_in(&mut tx, item_id, new_quantity, reference, notes).await?;
        tx.commit().await?;

        if let Some(movement) = &movement {
            info!(item_id = %item_id, new_quantity, delta = movement.quantity, "Stock adjusted");
        }
        Ok(movement)
    }

    /// Movement history of an item, newest first.
    pub async fn movements(&self, item_id: &str, limit: u32) -> DbResult<Vec<StockMovement>> {
        let mut conn = self.pool.acquire().await?;
        stock::fetch_movements(&mut conn, item_id, limit).await
    }

    pub async fn reconcile(&self, item_id: &str) -> DbResult<Reconciliation> {
        let mut conn = self.pool.acquire().await?;

        let stock_quantity = item::fetch_stock(&mut conn, item_id)
            .await?
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        let movement_total = stock::movement_total(&mut conn, item_id).await?;

        let report = Reconciliation {
            item_id: item_id.to_string(),
            stock_quantity,
            movement_total,
        };
        if !report.is_balanced() {
            warn!(item_id = %item_id, drift = report.drift(), "Stock does not match movements");
        }
        Ok(report)
    }
}
