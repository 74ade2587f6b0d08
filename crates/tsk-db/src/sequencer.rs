//! # Invoice Sequencer
//!
//! Picks the next invoice number for a prefix.
//!
//! ```text
//! bills: TSK000001 … TSK000007
//!           │
//!           ▼  max_invoice_suffix("TSK") = 7
//!        TSK000008
//!
//! bills: TSK000007, TSKABC (corrupt suffix)
//!           │
//!           ▼  lookup fails → warn, never block the sale
//!        TSK20261017143005            (prefix + local YYYYMMDDHHMMSS)
//!        TSK2026101714300501          (same second, retry 1)
//! ```
//!
//! Uniqueness is enforced by the `invoice_number` UNIQUE constraint, not
//! here. `BillingService::create_draft` retries with a fresh number when
//! the insert collides.

use chrono::Local;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::warn;

use tsk_core::invoice::{fallback_invoice_number, next_invoice_number};
use tsk_core::validation::validate_invoice_prefix;
use tsk_core::DEFAULT_INVOICE_PREFIX;

use crate::error::DbResult;
use crate::repository::{bill, settings};

/// Configured invoice prefix, or the default when unset or invalid.
pub async fn invoice_prefix(conn: &mut SqliteConnection) -> String {
    match settings::fetch_setting(conn, settings::INVOICE_PREFIX).await {
        Ok(Some(prefix)) if validate_invoice_prefix(&prefix).is_ok() => prefix.trim().to_string(),
        Ok(None) => DEFAULT_INVOICE_PREFIX.to_string(),
        Ok(Some(prefix)) => {
            warn!(prefix = %prefix, "Invalid invoice_prefix setting, using default");
            DEFAULT_INVOICE_PREFIX.to_string()
        }
        Err(e) => {
            warn!(error = %e, "Could not read invoice_prefix setting, using default");
            DEFAULT_INVOICE_PREFIX.to_string()
        }
    }
}

/// Next invoice number for `prefix`. Never fails.
///
/// `attempt` is the retry count after uniqueness collisions; it only
/// changes the timestamp fallback, which otherwise repeats within a second.
pub async fn next_number(conn: &mut SqliteConnection, prefix: &str, attempt: u32) -> String {
    let fallback = |reason: &str| {
        let number = fallback_invoice_number(prefix, Local::now().naive_local(), attempt);
        warn!(prefix = %prefix, reason = %reason, invoice_number = %number, "Using fallback invoice number");
        number
    };

    match bill::max_invoice_suffix(conn, prefix).await {
        Ok(max) => match next_invoice_number(prefix, max) {
            Some(number) => number,
            None => fallback("sequence cannot advance"),
        },
        Err(e) => fallback(&e.to_string()),
    }
}

/// Read-only access to the sequence, for display before a draft exists.
#[derive(Debug, Clone)]
pub struct InvoiceSequencer {
    pool: SqlitePool,
}

impl InvoiceSequencer {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceSequencer { pool }
    }

    pub async fn prefix(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Ok(invoice_prefix(&mut conn).await)
    }

    /// The number the next draft would get with `prefix`.
    pub async fn next_invoice_number(&self, prefix: &str) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        Ok(next_number(&mut conn, prefix, 0).await)
    }
}
