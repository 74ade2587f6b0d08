//! # Category Repository
//!
//! Named catalog categories. Items store the category name; saving an item
//! registers its category here, so the list always covers what is in use.
//! Names are unique regardless of case.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tsk_core::validation::validate_category_name;
use tsk_core::Category;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: String,
    name: String,
    item_count: i64,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            item_count: row.item_count,
        }
    }
}

/// Registers `name` if it is new and returns the stored spelling.
///
/// `silk` after `Silk` returns `Silk`, so items share one category.
pub async fn ensure_category(conn: &mut SqliteConnection, name: &str) -> DbResult<String> {
    validate_category_name(name)?;
    let name = name.trim();

    sqlx::query(
        "INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3) ON CONFLICT (name) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let stored: String = sqlx::query_scalar("SELECT name FROM categories WHERE name = ?1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(stored)
}

/// Repository for categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// `add_category`: registers a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - A category with that name exists
    pub async fn add(&self, name: &str) -> DbResult<Category> {
        validate_category_name(name)?;
        let name = name.trim();
        debug!(name = %name, "Adding category");

        let id = Uuid::new_v4().to_string();
        let result = sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&id)
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(Category {
                id,
                name: name.to_string(),
                item_count: 0,
            }),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => Err(DbError::duplicate(field, name)),
                other => Err(other),
            },
        }
    }

    /// `get_all_categories`: every category by name, with its active item count.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.name,
                   (SELECT COUNT(*) FROM items i
                    WHERE i.category = c.name COLLATE NOCASE AND i.is_active = 1) AS item_count
            FROM categories c
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }
}
