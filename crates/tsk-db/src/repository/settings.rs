//! # Settings Repository
//!
//! Key/value business settings stored in the `settings` table.
//!
//! | key                   | default        | read by                 |
//! |-----------------------|----------------|-------------------------|
//! | `invoice_prefix`      | `TSK`          | invoice sequencer       |
//! | `low_stock_threshold` | `5`            | low stock report        |
//! | `shop_name`           | `TSK Textiles` | console header          |
//! | `shop_address`        | empty          | console header          |

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use tsk_core::invoice::shadows_longer_prefix;
use tsk_core::validation::{validate_invoice_prefix, validate_stock_quantity};
use tsk_core::{ValidationError, DEFAULT_LOW_STOCK_THRESHOLD};

use crate::error::DbResult;

pub const INVOICE_PREFIX: &str = "invoice_prefix";
pub const LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
pub const SHOP_NAME: &str = "shop_name";
pub const SHOP_ADDRESS: &str = "shop_address";

/// `get_setting`: reads one value inside the caller's transaction.
pub async fn fetch_setting(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(value)
}

/// Inserts or replaces one value.
pub async fn store_setting(conn: &mut SqliteConnection, key: &str, value: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Repository for settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        fetch_setting(&mut conn, key).await
    }

    /// Sets a value. Known keys are validated before they are stored.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let value = value.trim();
        match key {
            INVOICE_PREFIX => {
                validate_invoice_prefix(value)?;
                self.ensure_prefix_is_free(value).await?;
            }
            LOW_STOCK_THRESHOLD => {
                let threshold = value.parse::<i64>().map_err(|_| ValidationError::InvalidFormat {
                    field: LOW_STOCK_THRESHOLD.to_string(),
                    reason: "must be a whole number".to_string(),
                })?;
                validate_stock_quantity(threshold)?;
            }
            _ => {}
        }

        debug!(key = %key, value = %value, "Storing setting");
        let mut conn = self.pool.acquire().await?;
        store_setting(&mut conn, key, value).await
    }

    /// Rejects a prefix that is the start of another prefix already on
    /// invoices (`TS` while `TSK000001` exists).
    async fn ensure_prefix_is_free(&self, prefix: &str) -> DbResult<()> {
        let numbers: Vec<String> = sqlx::query_scalar(
            "SELECT invoice_number FROM bills WHERE substr(invoice_number, 1, length(?1)) = ?1",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        match numbers.iter().find(|n| shadows_longer_prefix(prefix, n)) {
            Some(number) => Err(ValidationError::InvalidFormat {
                field: INVOICE_PREFIX.to_string(),
                reason: format!("'{}' is the start of invoice {}", prefix, number),
            }
            .into()),
            None => Ok(()),
        }
    }

    /// All settings ordered by key.
    pub async fn all(&self) -> DbResult<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    /// Low stock threshold, falling back to the default on a bad value.
    pub async fn low_stock_threshold(&self) -> DbResult<i64> {
        let raw = self.get(LOW_STOCK_THRESHOLD).await?;
        Ok(match raw.as_deref().map(str::parse::<i64>) {
            Some(Ok(value)) if value >= 0 => value,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
            Some(_) => {
                warn!(value = ?raw, "Invalid low_stock_threshold setting, using default");
                DEFAULT_LOW_STOCK_THRESHOLD
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_seeded_defaults() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        assert_eq!(settings.get(INVOICE_PREFIX).await.unwrap().as_deref(), Some("TSK"));
        assert_eq!(settings.low_stock_threshold().await.unwrap(), 5);
        assert!(settings.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_validates_known_keys() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        settings.set(INVOICE_PREFIX, "INV").await.unwrap();
        assert_eq!(settings.get(INVOICE_PREFIX).await.unwrap().as_deref(), Some("INV"));

        assert!(settings.set(INVOICE_PREFIX, "IN V").await.is_err());
        assert!(settings.set(LOW_STOCK_THRESHOLD, "-3").await.is_err());
        assert!(settings.set(LOW_STOCK_THRESHOLD, "few").await.is_err());

        settings.set(LOW_STOCK_THRESHOLD, "12").await.unwrap();
        assert_eq!(settings.low_stock_threshold().await.unwrap(), 12);

        settings.set(SHOP_NAME, "Sri Lakshmi Silks").await.unwrap();
        assert_eq!(settings.all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_prefix_cannot_cut_into_issued_invoices() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();
        let staff = db.staff().insert("Anand").await.unwrap();
        db.billing().create_draft(&staff.id, None).await.unwrap();

        let err = settings.set(INVOICE_PREFIX, "TS").await.unwrap_err();
        assert!(err.to_string().contains("TSK000001"));
        assert_eq!(settings.get(INVOICE_PREFIX).await.unwrap().as_deref(), Some("TSK"));

        // a longer prefix and the current one are both fine
        settings.set(INVOICE_PREFIX, "TSKA").await.unwrap();
        settings.set(INVOICE_PREFIX, "TSK").await.unwrap();
    }
}
