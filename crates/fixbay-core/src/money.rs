//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a few thousand stock values as floats drifts:                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A valuation report whose bucket totals don't add up to the grand      │
//! │  total is worse than useless.                                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    value = on_hand × unit_cost_cents  (exact)                           │
//! │    Σ bucket values == total value     (exact)                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fixbay_core::money::Money;
//!
//! let unit_cost = Money::from_cents(1000); // $10.00
//! let value = unit_cost.multiply_quantity(40);
//! assert_eq!(value.cents(), 40_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative stock on hand yields a negative value, and
///   a loss-making product has a negative gross profit
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  StockLevel.average_unit_cost ─┐                                        │
/// │  Product.average_cost ─────────┼──► unit cost ──► StockValuation value │
/// │  Product.cost_price ───────────┘                                        │
/// │                                                                         │
/// │  InvoiceLineItem.total ──────────► revenue ──┐                          │
/// │  qty × Product.cost_price ───────► COGS ─────┴──► gross profit          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use fixbay_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use fixbay_core::money::Money;
    ///
    /// let unit_cost = Money::from_cents(6000); // $60.00
    /// assert_eq!(unit_cost.multiply_quantity(2).cents(), 12000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Divides money by a quantity, rounding half away from zero.
    ///
    /// Returns `None` when `qty` is zero, so callers must decide what an
    /// empty denominator means for them.
    ///
    /// ## Example
    /// ```rust
    /// use fixbay_core::money::Money;
    ///
    /// let total = Money::from_cents(1000);
    /// assert_eq!(total.divide_by_quantity(3), Some(Money::from_cents(333)));
    /// assert_eq!(Money::from_cents(500).divide_by_quantity(3), Some(Money::from_cents(167)));
    /// assert_eq!(total.divide_by_quantity(0), None);
    /// ```
    pub fn divide_by_quantity(&self, qty: i64) -> Option<Money> {
        if qty == 0 {
            return None;
        }

        // i128 keeps large stock values from overflowing the rounding step
        let num = self.0 as i128;
        let den = qty as i128;
        let negative = (num < 0) != (den < 0);
        let (num, den) = (num.abs(), den.abs());
        let rounded = (num + den / 2) / den;
        let rounded = if negative { -rounded } else { rounded };

        Some(Money::from_cents(rounded as i64))
    }

    /// Expresses `self` as a percentage of `whole`.
    ///
    /// Returns `0.0` when `whole` is zero (no division by zero).
    ///
    /// ## Example
    /// ```rust
    /// use fixbay_core::money::Money;
    ///
    /// let profit = Money::from_cents(8000);
    /// let revenue = Money::from_cents(20000);
    /// assert_eq!(profit.percent_of(revenue), 40.0);
    /// assert_eq!(profit.percent_of(Money::zero()), 0.0);
    /// ```
    pub fn percent_of(&self, whole: Money) -> f64 {
        if whole.is_zero() {
            return 0.0;
        }
        self.0 as f64 / whole.0 as f64 * 100.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in a human-readable format.
///
/// ## Note
/// The web dashboards format for display themselves; this is for the CLI
/// table output and logs.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let values = vec![
            Money::from_cents(100),
            Money::from_cents(250),
            Money::from_cents(-50),
        ];
        let by_ref: Money = values.iter().sum();
        let by_value: Money = values.into_iter().sum();
        assert_eq!(by_ref.cents(), 300);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_divide_by_quantity_rounding() {
        assert_eq!(
            Money::from_cents(1000).divide_by_quantity(4),
            Some(Money::from_cents(250))
        );
        // 2.5 rounds away from zero
        assert_eq!(
            Money::from_cents(5).divide_by_quantity(2),
            Some(Money::from_cents(3))
        );
        assert_eq!(
            Money::from_cents(-5).divide_by_quantity(2),
            Some(Money::from_cents(-3))
        );
        assert_eq!(
            Money::from_cents(1000).divide_by_quantity(-3),
            Some(Money::from_cents(-333))
        );
        assert_eq!(Money::from_cents(1000).divide_by_quantity(0), None);
    }

    #[test]
    fn test_percent_of() {
        let part = Money::from_cents(8000);
        assert_eq!(part.percent_of(Money::from_cents(20000)), 40.0);
        assert_eq!(part.percent_of(Money::zero()), 0.0);
        assert_eq!(Money::from_cents(-500).percent_of(Money::from_cents(1000)), -50.0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_cost = Money::from_cents(1000);
        assert_eq!(unit_cost.multiply_quantity(40).cents(), 40_000);
    }
}
