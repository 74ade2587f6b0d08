//! # Stock Movement Repository
//!
//! The append-only `stock_movements` table. Rows are inserted and read,
//! never updated or deleted by application code. Deleting an item only
//! clears `item_id` on its rows.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use tsk_core::{MovementType, ReferenceType, StockMovement};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: String,
    item_id: Option<String>,
    quantity: i64,
    movement_type: MovementType,
    reference_type: ReferenceType,
    reference_id: Option<String>,
    staff_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MovementRow> for StockMovement {
    fn from(row: MovementRow) -> Self {
        StockMovement {
            id: row.id,
            item_id: row.item_id,
            quantity: row.quantity,
            movement_type: row.movement_type,
            reference_type: row.reference_type,
            reference_id: row.reference_id,
            staff_id: row.staff_id,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

/// `append_stock_movement`: writes one ledger entry.
pub async fn append_movement(conn: &mut SqliteConnection, movement: &StockMovement) -> DbResult<()> {
    debug!(
        item_id = ?movement.item_id,
        quantity = movement.quantity,
        reference_type = ?movement.reference_type,
        "Appending stock movement"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, item_id, quantity, movement_type,
            reference_type, reference_id, staff_id, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.item_id)
    .bind(movement.quantity)
    .bind(movement.movement_type)
    .bind(movement.reference_type)
    .bind(&movement.reference_id)
    .bind(&movement.staff_id)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Most recent movements of an item, newest first.
pub async fn fetch_movements(
    conn: &mut SqliteConnection,
    item_id: &str,
    limit: u32,
) -> DbResult<Vec<StockMovement>> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        r#"
        SELECT id, item_id, quantity, movement_type, reference_type,
               reference_id, staff_id, notes, created_at
        FROM stock_movements
        WHERE item_id = ?1
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?2
        "#,
    )
    .bind(item_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(StockMovement::from).collect())
}

/// Movements written for one bill (sale or cancellation), oldest first.
pub async fn fetch_for_reference(
    conn: &mut SqliteConnection,
    reference_type: ReferenceType,
    reference_id: &str,
) -> DbResult<Vec<StockMovement>> {
    let rows: Vec<MovementRow> = sqlx::query_as(
        r#"
        SELECT id, item_id, quantity, movement_type, reference_type,
               reference_id, staff_id, notes, created_at
        FROM stock_movements
        WHERE reference_type = ?1 AND reference_id = ?2
        ORDER BY rowid
        "#,
    )
    .bind(reference_type)
    .bind(reference_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(StockMovement::from).collect())
}

/// Σ signed quantities of an item's movements.
pub async fn movement_total(conn: &mut SqliteConnection, item_id: &str) -> DbResult<i64> {
    let total: Option<i64> =
        sqlx::query_scalar("SELECT SUM(quantity) FROM stock_movements WHERE item_id = ?1")
            .bind(item_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(total.unwrap_or(0))
}
