//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A cart total patched with floats drifts after enough add/remove       │
//! │  cycles. Integer cents never drift:                                    │
//! │    1000 cents × 3 = 3000 cents, every time                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cartledger_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let doubled = price * 2_i64;         // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//! assert_eq!(total.cents(), 1599);
//! assert_eq!(doubled.cents(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► CartItem.product_price_cents (snapshot)
///                                │
///                                ▼
///                  × quantity = CartItem.subtotal_cents
///                                │
///                                ▼
///                  Σ subtotals = Cart.total_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use cartledger_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
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

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cartledger_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Overflow-checked variant of [`Money::multiply_quantity`].
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Overflow-checked addition, used when summing line totals.
    ///
    /// ```rust
    /// use cartledger_core::money::Money;
    ///
    /// assert_eq!(
    ///     Money::from_cents(1).checked_add(Money::from_cents(2)),
    ///     Some(Money::from_cents(3))
    /// );
    /// assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    /// ```
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly formatting, e.g. `$10.99`.
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing line subtotals into a cart total.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
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
        assert_eq!(format!("{}", Money::from_cents(5000)), "$50.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a * 3_i64).cents(), 3000);
    }

    #[test]
    fn test_sum_of_subtotals() {
        let total: Money = [1000, 2500, 1]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 3501);

        let empty: Money = std::iter::empty().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_checked_multiply_overflow() {
        assert_eq!(
            Money::from_cents(1000).checked_multiply_quantity(5),
            Some(Money::from_cents(5000))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_checked_add_overflow() {
        let half = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(half.checked_add(half), None);
        assert_eq!(
            Money::from_cents(1000).checked_add(Money::from_cents(1)),
            Some(Money::from_cents(1001))
        );
    }

    /// Ten thousand ten-cent lines sum to exactly $1,000.00.
    #[test]
    fn test_no_drift_over_many_lines() {
        let mut total = Money::zero();
        for _ in 0..10_000 {
            total += Money::from_cents(10);
        }
        assert_eq!(total.cents(), 100_000);
        assert_eq!(total.to_string(), "$1000.00");
    }
}
