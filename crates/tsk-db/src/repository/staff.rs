//! # Staff Repository
//!
//! Counter staff who open bills. Staff are deactivated, never deleted, so
//! past bills keep a valid `staff_id`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tsk_core::validation::validate_staff_name;
use tsk_core::Staff;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: String,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Staff {
            id: row.id,
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

/// Loads a staff member inside the caller's transaction.
pub async fn fetch_staff(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Staff>> {
    let row: Option<StaffRow> =
        sqlx::query_as("SELECT id, name, is_active, created_at FROM staff WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(Staff::from))
}

/// Repository for staff accounts.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Adds a staff member.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already taken
    pub async fn insert(&self, name: &str) -> DbResult<Staff> {
        validate_staff_name(name)?;

        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %staff.id, name = %staff.name, "Inserting staff");

        sqlx::query("INSERT INTO staff (id, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&staff.id)
            .bind(&staff.name)
            .bind(staff.is_active)
            .bind(staff.created_at)
            .execute(&self.pool)
            .await?;

        Ok(staff)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let mut conn = self.pool.acquire().await?;
        fetch_staff(&mut conn, id).await
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Staff>> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, name, is_active, created_at FROM staff WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Staff::from))
    }

    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<Staff>> {
        let rows: Vec<StaffRow> = sqlx::query_as(
            "SELECT id, name, is_active, created_at FROM staff WHERE is_active = 1 OR ?1 ORDER BY name",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Staff::from).collect())
    }

    /// Deactivates a staff member; they can no longer open bills.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating staff");

        let result = sqlx::query("UPDATE staff SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_staff_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let staff = db.staff();

        let ravi = staff.insert("Ravi").await.unwrap();
        staff.insert("Meena").await.unwrap();
        assert!(staff.insert("Ravi").await.unwrap_err().is_unique_violation_on("name"));
        assert!(staff.insert("  ").await.is_err());

        assert_eq!(staff.get_by_name("ravi").await.unwrap().map(|s| s.id), Some(ravi.id.clone()));

        staff.deactivate(&ravi.id).await.unwrap();
        let active = staff.list(false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Meena");
        assert_eq!(staff.list(true).await.unwrap().len(), 2);
        assert!(!staff.get_by_id(&ravi.id).await.unwrap().unwrap().is_active);
    }
}
