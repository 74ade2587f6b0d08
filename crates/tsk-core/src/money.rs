//! # Money Module
//!
//! Provides the `Money` and `Percent` types for handling rupee amounts and
//! rates safely.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In GST billing:                                                        │
//! │    ₹333.33 × 5% / 2 = ₹8.33325 CGST → cannot be stored in paise         │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, rounded ONCE                            │
//! │    Line and tax math stays exact (sub-paise fractions kept)            │
//! │    The bill grand total is rounded to whole rupees at the very end     │
//! │    Persistence stores paise (i64), rounded half-to-even                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tsk_core::money::{Money, Percent};
//!
//! let price = Money::from_paise(100_000); // ₹1000.00
//! let line = price * 2;                   // ₹2000.00
//! let discount = line.percent_of(Percent::from_whole(10));
//! assert_eq!(discount, Money::from_rupees(200));
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// Basis points in one whole (100%).
const BPS_PER_WHOLE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// An exact rupee amount.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Allows negative values for round-off and reversals
/// - **Single field tuple struct**: Zero-cost wrapper, arithmetic stays exact
/// - **Serialized as a string**: `"1890.00"` survives JSON without float loss
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Item.price ──► BillLine.unit_price ──► LineCalc (taxable, gst, total)  │
/// │                                                                         │
/// │  Σ LineCalc ──► BillTotals (subtotal, cgst/sgst/igst, round_off)        │
/// │                                                                         │
/// │  BillTotals ──► persisted as *_paise columns ──► reports               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a Money value from paise (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tsk_core::money::Money;
    ///
    /// let price = Money::from_paise(250_050); // ₹2500.50
    /// assert_eq!(price.to_string(), "₹2500.50");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, 2))
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Wraps an exact decimal rupee amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact decimal rupee amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns the value in paise, rounded half-to-even.
    ///
    /// This is the only lossy conversion on `Money`; it is used when a value
    /// is written to storage. Amounts beyond `i64` paise are rejected.
    ///
    /// ## Example
    /// ```rust
    /// use tsk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let cgst = Money::from_decimal(Decimal::new(833325, 5)); // ₹8.33325
    /// assert_eq!(cgst.to_paise().unwrap(), 833);
    /// ```
    pub fn to_paise(&self) -> Result<i64, ValidationError> {
        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| {
                scaled
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                    .to_i64()
            })
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "amount in paise".to_string(),
                min: i64::MIN,
                max: i64::MAX,
            })
    }

    /// Rounds to whole paise, ties to even. Stays exact `Money`.
    pub fn round_to_paise(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Rounds to the nearest whole rupee, ties to even.
    ///
    /// ## Rounding Policy
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF TO EVEN (Bankers Rounding)                              │
    /// │                                                                     │
    /// │    1700.49 → 1700     1700.50 → 1700     1700.51 → 1701            │
    /// │    1701.50 → 1702     -0.50   → 0                                   │
    /// │                                                                     │
    /// │  Ties alternate direction, so there is no systematic drift over    │
    /// │  many bills.                                                        │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    pub fn round_to_rupee(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                .normalize(),
        )
    }

    /// Returns `rate` percent of this amount, without rounding.
    ///
    /// ## Example
    /// ```rust
    /// use tsk_core::money::{Money, Percent};
    ///
    /// let taxable = Money::from_rupees(1800);
    /// let gst = taxable.percent_of(Percent::from_whole(5));
    /// assert_eq!(gst, Money::from_rupees(90));
    /// ```
    pub fn percent_of(&self, rate: Percent) -> Money {
        Money(self.0 * Decimal::from(rate.bps()) / Decimal::from(BPS_PER_WHOLE))
    }

    /// Scales this amount by `numerator / denominator`.
    ///
    /// Returns zero when the denominator is zero.
    pub fn scale(&self, numerator: Money, denominator: Money) -> Money {
        if denominator.is_zero() {
            return Money::zero();
        }
        Money(self.0 * numerator.0 / denominator.0)
    }

    /// Splits the amount into two equal halves (exact).
    #[inline]
    pub fn half(&self) -> Money {
        Money(self.0 / Decimal::TWO)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Checks if the value has no fractional rupee part.
    #[inline]
    pub fn is_whole_rupees(&self) -> bool {
        self.0.fract().is_zero()
    }
}

/// Display shows rupees with two decimals, e.g. `₹1890.00` or `-₹0.40`.
///
/// ## Note
/// This is for logs and the console. Sub-paise fractions are rounded for
/// display only.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_paise().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        write!(f, "{}₹{:.2}", sign, rounded.abs())
    }
}

/// Parses a rupee amount such as `"2500"` or `"2500.50"`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|_| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!("'{}' is not a decimal amount", s),
            })
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// A percentage rate in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 500 bps = 5% (GST on most textiles), 1250 bps = 12.5% discount
///
/// The value is signed so that a negative input can reach validation and be
/// rejected instead of being silently clamped by an unsigned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps)
    }

    /// Creates a rate from a whole percentage (`5` → 5%).
    #[inline]
    pub const fn from_whole(pct: i64) -> Self {
        Percent(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a decimal percentage (`500` bps → `5.00`).
    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the rate is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_decimal())
    }
}

/// Parses `"5"`, `"12.5"` or `"12.5%"`. More than two decimals is rejected.
impl FromStr for Percent {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_end_matches('%');
        let invalid = || ValidationError::InvalidFormat {
            field: "percentage".to_string(),
            reason: format!("'{}' is not a percentage with at most 2 decimals", s),
        };

        let value = Decimal::from_str(raw).map_err(|_| invalid())?;
        let bps = value * Decimal::ONE_HUNDRED;
        if !bps.fract().is_zero() {
            return Err(invalid());
        }

        let bps = bps.normalize();
        i64::try_from(bps.mantissa())
            .map(Percent)
            .map_err(|_| invalid())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(250_050);
        assert_eq!(money.amount(), dec("2500.50"));
        assert_eq!(money.to_paise().unwrap(), 250_050);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(189_000).to_string(), "₹1890.00");
        assert_eq!(Money::from_paise(5).to_string(), "₹0.05");
        assert_eq!(Money::from_paise(-40).to_string(), "-₹0.40");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupees(1000);
        let b = Money::from_rupees(250);

        assert_eq!(a + b, Money::from_rupees(1250));
        assert_eq!(a - b, Money::from_rupees(750));
        assert_eq!(a * 3, Money::from_rupees(3000));
        assert_eq!(-b, Money::from_rupees(-250));

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total, Money::from_rupees(1500));
    }

    #[test]
    fn test_percent_of_keeps_fractions() {
        // ₹333.33 at 5% = ₹16.6665, nothing rounded
        let amount = Money::from_paise(33_333);
        let tax = amount.percent_of(Percent::from_whole(5));
        assert_eq!(tax.amount(), dec("16.6665"));
        assert_eq!(tax.half().amount(), dec("8.33325"));
    }

    #[test]
    fn test_to_paise_rounds_half_even() {
        assert_eq!(Money::from_decimal(dec("0.125")).to_paise().unwrap(), 12);
        assert_eq!(Money::from_decimal(dec("0.135")).to_paise().unwrap(), 14);
        assert_eq!(Money::from_decimal(dec("-0.125")).to_paise().unwrap(), -12);
        assert_eq!(Money::from_decimal(dec("8.33325")).to_paise().unwrap(), 833);
    }

    #[test]
    fn test_to_paise_rejects_amounts_beyond_i64() {
        let huge = Money::from_rupees(190_000_000_000_000_000);
        assert!(matches!(huge.to_paise(), Err(ValidationError::OutOfRange { .. })));

        let largest = Money::from_paise(i64::MAX);
        assert_eq!(largest.to_paise().unwrap(), i64::MAX);
    }

    #[test]
    fn test_round_to_paise() {
        assert_eq!(Money::from_decimal(dec("2.6275")).round_to_paise(), Money::from_paise(263));
        assert_eq!(Money::from_decimal(dec("2.625")).round_to_paise(), Money::from_paise(262));
    }

    #[test]
    fn test_round_to_rupee_ties_to_even() {
        assert_eq!(
            Money::from_decimal(dec("1700.50")).round_to_rupee(),
            Money::from_rupees(1700)
        );
        assert_eq!(
            Money::from_decimal(dec("1701.50")).round_to_rupee(),
            Money::from_rupees(1702)
        );
        assert_eq!(
            Money::from_decimal(dec("1700.51")).round_to_rupee(),
            Money::from_rupees(1701)
        );
        assert_eq!(
            Money::from_decimal(dec("1700.49")).round_to_rupee(),
            Money::from_rupees(1700)
        );
        assert!(Money::from_decimal(dec("1701.00")).round_to_rupee().is_whole_rupees());
    }

    #[test]
    fn test_scale_by_ratio() {
        let gst = Money::from_rupees(90);
        let scaled = gst.scale(Money::from_rupees(1620), Money::from_rupees(1800));
        assert_eq!(scaled, Money::from_rupees(81));

        // Zero denominator is treated as a zero ratio
        assert_eq!(gst.scale(Money::from_rupees(5), Money::zero()), Money::zero());
    }

    #[test]
    fn test_parse_money() {
        assert_eq!("2500.50".parse::<Money>().unwrap(), Money::from_paise(250_050));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn test_percent_parse_and_display() {
        assert_eq!("5".parse::<Percent>().unwrap(), Percent::from_bps(500));
        assert_eq!("12.5%".parse::<Percent>().unwrap(), Percent::from_bps(1250));
        assert_eq!("-2".parse::<Percent>().unwrap(), Percent::from_bps(-200));
        assert!("1.005".parse::<Percent>().is_err());
        assert!("ten".parse::<Percent>().is_err());

        assert_eq!(Percent::from_whole(5).to_string(), "5.00%");
    }

    #[test]
    fn test_serde_is_lossless() {
        let money = Money::from_decimal(dec("8.33325"));
        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, "\"8.33325\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money);

        let json = serde_json::to_string(&Percent::from_bps(500)).unwrap();
        assert_eq!(json, "500");
    }
}
