//! # Invoice Numbering
//!
//! Pure half of the invoice sequencer. Storage lookups live in
//! `tsk-db::sequencer`; this module only formats numbers.
//!
//! ```text
//! existing max suffix ──► +1 ──► zero pad to 6 ──► TSK000008
//!        │
//!        └── lookup failed / corrupt / overflow ──► TSK20261017143005
//! ```
//!
//! Numbers are gap-tolerant: an abandoned draft keeps its number, so the
//! sequence is strictly increasing but not contiguous.

use chrono::NaiveDateTime;

use crate::INVOICE_DIGITS;

/// Joins a prefix and a sequence number: `("TSK", 8)` → `TSK000008`.
pub fn format_invoice_number(prefix: &str, sequence: i64) -> String {
    format!("{}{:0width$}", prefix, sequence, width = INVOICE_DIGITS)
}

/// Returns the number after `max_suffix`, starting at 1 for a fresh prefix.
///
/// `None` is returned only when the sequence cannot advance (overflow or a
/// negative stored suffix); callers then use [`fallback_invoice_number`].
///
/// ## Example
/// ```rust
/// use tsk_core::invoice::next_invoice_number;
///
/// assert_eq!(next_invoice_number("TSK", Some(7)).as_deref(), Some("TSK000008"));
/// assert_eq!(next_invoice_number("TSK", None).as_deref(), Some("TSK000001"));
/// ```
pub fn next_invoice_number(prefix: &str, max_suffix: Option<i64>) -> Option<String> {
    let next = match max_suffix {
        None => 1,
        Some(max) if max < 0 => return None,
        Some(max) => max.checked_add(1)?,
    };

    Some(format_invoice_number(prefix, next))
}

/// Timestamp-derived number used when the sequence cannot be read.
///
/// The first attempt is `prefix + YYYYMMDDHHMMSS`. Retries after a
/// uniqueness conflict append the attempt number so two fallbacks in the
/// same second still differ, keeping the suffix numeric.
pub fn fallback_invoice_number(prefix: &str, now: NaiveDateTime, attempt: u32) -> String {
    let stamp = now.format("%Y%m%d%H%M%S");
    if attempt == 0 {
        format!("{}{}", prefix, stamp)
    } else {
        format!("{}{}{:02}", prefix, stamp, attempt)
    }
}

/// Extracts the numeric suffix of an invoice number issued under `prefix`.
///
/// Returns `None` for another prefix or a non-numeric suffix.
pub fn invoice_suffix(prefix: &str, invoice_number: &str) -> Option<i64> {
    let suffix = invoice_number.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// True when `invoice_number` was issued under a longer prefix that starts
/// with `prefix`, e.g. `TSK000001` for the prefix `TS`.
///
/// Such a number would read as a corrupt suffix under `prefix` and push
/// every new invoice onto the timestamp fallback.
pub fn shadows_longer_prefix(prefix: &str, invoice_number: &str) -> bool {
    let Some(rest) = invoice_number.strip_prefix(prefix) else {
        return false;
    };
    let starts_with_letter = rest.bytes().next().is_some_and(|b| !b.is_ascii_digit());
    let ends_with_digit = rest.bytes().last().is_some_and(|b| b.is_ascii_digit());
    starts_with_letter && ends_with_digit
}

// =============================================================================
// Unit Tests
// =============================================================================
