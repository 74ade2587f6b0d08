//! # Item Repository
//!
//! Catalog items: CRUD, search and the stock column. Saving an item
//! registers its category in `categories`.
//!
//! ## Stock Column Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items.stock_quantity is written in exactly three places:              │
//! │                                                                         │
//! │   ItemRepository::insert   → opening stock (+ OPENING_STOCK movement)  │
//! │   ledger::deduct / restore → conditional ± delta (+ OUT / IN movement) │
//! │   store_stock              → absolute value (+ ADJUSTMENT movement)    │
//! │                                                                         │
//! │  Each write shares a transaction with its movement, so                 │
//! │  Σ stock_movements.quantity == items.stock_quantity at all times.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tsk_core::types::StockReference;
use tsk_core::validation::{
    validate_barcode, validate_gst_rate, validate_hsn_code, validate_item_name,
    validate_search_query, validate_stock_quantity, validate_unit_price,
};
use tsk_core::{Item, Money, Percent, StockMovement};

use super::{category, money, percent, stock};
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str = "id, barcode, name, hsn_code, category, price_paise, gst_rate_bps, \
                            stock_quantity, is_active, created_at, updated_at";

// =============================================================================
// Rows and Inputs
// =============================================================================

/// Raw `items` row.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    barcode: Option<String>,
    name: String,
    hsn_code: Option<String>,
    category: Option<String>,
    price_paise: i64,
    gst_rate_bps: i64,
    stock_quantity: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> DbResult<Item> {
        let price = money(self.price_paise);
        let gst_rate = percent(self.gst_rate_bps);

        validate_unit_price(price).map_err(|e| DbError::corrupt("items", &self.id, e))?;
        validate_gst_rate(gst_rate).map_err(|e| DbError::corrupt("items", &self.id, e))?;
        validate_stock_quantity(self.stock_quantity)
            .map_err(|e| DbError::corrupt("items", &self.id, e))?;

        Ok(Item {
            id: self.id,
            barcode: self.barcode,
            name: self.name,
            hsn_code: self.hsn_code,
            category: self.category,
            price,
            gst_rate,
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Input for a new catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub barcode: Option<String>,
    pub name: String,
    pub hsn_code: Option<String>,
    pub category: Option<String>,
    pub price: Money,
    pub gst_rate: Percent,
    pub stock_quantity: i64,
}

/// Editable catalog fields. Stock changes go through the inventory ledger.
#[derive(Debug, Clone)]
pub struct ItemUpdate {
    pub barcode: Option<String>,
    pub name: String,
    pub hsn_code: Option<String>,
    pub category: Option<String>,
    pub price: Money,
    pub gst_rate: Percent,
}

fn validate_details(
    name: &str,
    barcode: Option<&str>,
    hsn_code: Option<&str>,
    price: Money,
    gst_rate: Percent,
) -> DbResult<()> {
    validate_item_name(name)?;
    if let Some(barcode) = barcode {
        validate_barcode(barcode)?;
    }
    if let Some(hsn) = hsn_code {
        validate_hsn_code(hsn)?;
    }
    validate_unit_price(price)?;
    validate_gst_rate(gst_rate)?;
    Ok(())
}

/// Blank optional text is stored as NULL so UNIQUE(barcode) ignores it.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Connection Functions
// =============================================================================

/// `get_item`: loads an item inside the caller's transaction.
pub async fn fetch_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
    let row: Option<ItemRow> =
        sqlx::query_as(&format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    row.map(ItemRow::into_item).transpose()
}

/// `get_stock`: current stock, `None` when the item does not exist.
pub async fn fetch_stock(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<i64>> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock_quantity FROM items WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(stock)
}

/// `set_stock`: writes an absolute stock level.
///
/// Only the inventory ledger calls this, paired with an ADJUSTMENT movement.
pub async fn store_stock(conn: &mut SqliteConnection, id: &str, quantity: i64) -> DbResult<()> {
    validate_stock_quantity(quantity)?;

    let result = sqlx::query("UPDATE items SET stock_quantity = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", id));
    }

    Ok(())
}

// =============================================================================
// Item Repository
// =============================================================================

/// Repository for catalog items.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let sarees = repo.search("silk", 20).await?;
/// let item = repo.get_by_barcode("8901234500017").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new item.
    ///
    /// Opening stock above zero is recorded as an `IN / OPENING_STOCK`
    /// movement in the same transaction.
    ///
    /// ## Returns
    /// * `Ok(Item)` - Inserted item
    /// * `Err(DbError::UniqueViolation)` - Barcode already exists
    pub async fn insert(&self, new: NewItem, staff_id: Option<&str>) -> DbResult<Item> {
        let barcode = non_blank(new.barcode);
        let hsn_code = non_blank(new.hsn_code);
        validate_details(
            &new.name,
            barcode.as_deref(),
            hsn_code.as_deref(),
            new.price,
            new.gst_rate,
        )?;
        validate_stock_quantity(new.stock_quantity)?;

        let now = Utc::now();
        let mut item = Item {
            id: Uuid::new_v4().to_string(),
            barcode,
            name: new.name.trim().to_string(),
            hsn_code,
            category: non_blank(new.category),
            price: new.price,
            gst_rate: new.gst_rate,
            stock_quantity: new.stock_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, stock = item.stock_quantity, "Inserting item");

        let mut tx = self.pool.begin().await?;

        if let Some(name) = &item.category {
            item.category = Some(category::ensure_category(&mut tx, name).await?);
        }

        sqlx::query(
            r#"
            INSERT INTO items (
                id, barcode, name, hsn_code, category,
                price_paise, gst_rate_bps, stock_quantity,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&item.id)
        .bind(&item.barcode)
        .bind(&item.name)
        .bind(&item.hsn_code)
        .bind(&item.category)
        .bind(item.price.to_paise()?)
        .bind(item.gst_rate.bps())
        .bind(item.stock_quantity)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        if item.stock_quantity > 0 {
            let mut reference = StockReference::opening_stock();
            reference.staff_id = staff_id.map(str::to_string);
            let movement = StockMovement::new(&item.id, item.stock_quantity, &reference, None);
            stock::append_movement(&mut tx, &movement).await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Gets an item by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Item>> {
        let row: Option<ItemRow> =
            sqlx::query_as(&format!("SELECT {} FROM items WHERE barcode = ?1", ITEM_COLUMNS))
                .bind(barcode.trim())
                .fetch_optional(&self.pool)
                .await?;

        row.map(ItemRow::into_item).transpose()
    }

    /// Searches active items by name, barcode or category.
    ///
    /// An empty query lists active items by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Item>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, limit = %limit, "Searching items");

        let pattern = format!("%{}%", query);
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM items
            WHERE is_active = 1
              AND (name LIKE ?1 OR barcode LIKE ?1 OR category LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
            ITEM_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ItemRow::into_item)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = items.len(), "Search returned items");
        Ok(items)
    }

    /// Lists items by name, optionally including deactivated ones.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Item>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {} FROM items WHERE is_active = 1 OR ?1 ORDER BY name",
            ITEM_COLUMNS
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Updates catalog details. Existing bill lines keep their snapshots.
    pub async fn update_details(&self, id: &str, update: ItemUpdate) -> DbResult<Item> {
        let barcode = non_blank(update.barcode);
        let hsn_code = non_blank(update.hsn_code);
        validate_details(
            &update.name,
            barcode.as_deref(),
            hsn_code.as_deref(),
            update.price,
            update.gst_rate,
        )?;

        debug!(id = %id, "Updating item");

        let mut tx = self.pool.begin().await?;
        let category = match non_blank(update.category) {
            Some(name) => Some(category::ensure_category(&mut tx, &name).await?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE items SET
                barcode = ?2,
                name = ?3,
                hsn_code = ?4,
                category = ?5,
                price_paise = ?6,
                gst_rate_bps = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&barcode)
        .bind(update.name.trim())
        .bind(&hsn_code)
        .bind(&category)
        .bind(update.price.to_paise()?)
        .bind(update.gst_rate.bps())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }
        tx.commit().await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }

    /// Soft-deletes an item: it stays on past bills but cannot be billed.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating item");

        let result = sqlx::query("UPDATE items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Hard-deletes an item.
    ///
    /// Bill lines keep their snapshot and stock movements keep their entry;
    /// both have `item_id` set to NULL.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Counts active items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
