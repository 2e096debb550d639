//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Store-credit plan, R$ 100,00 in 3x:                                    │
//! │    100.00 / 3 = 33.33 (×3 = 99.99)  → Lost R$ 0,01!                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer centavos                                         │
//! │    10000 / 3 = 3333 rem 1 → [3334, 3333, 3333]                          │
//! │    The remainder is assigned, never dropped                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use optica_core::money::Money;
//!
//! let lens = Money::from_cents(45_990); // R$459.90
//! let pair = lens * 2;
//! assert_eq!(pair.cents(), 91_980);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest BRL unit).
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleItemRequest.unit_price ──► line total ──► SaleTotals.subtotal     │
/// │                                                      │                  │
/// │                                   sale discount ─────┤                  │
/// │                                                      ▼                  │
/// │  PaymentRequest.amount ──── must sum to ────► SaleTotals.total         │
/// │        │                                             │                  │
/// │        ▼                                             ▼                  │
/// │  Installment amounts (split)              Commission (apply_rate)      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use optica_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -R$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use optica_core::money::Money;
    ///
    /// let frame = Money::from_cents(29_900);
    /// assert_eq!(frame.checked_mul_quantity(3), Some(Money::from_cents(89_700)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Checked addition.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Applies a basis-point rate, rounding half up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, computed in i128 so
    /// large sale totals cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use optica_core::money::Money;
    /// use optica_core::types::Rate;
    ///
    /// let total = Money::from_cents(100_000); // R$1000.00
    /// let commission = total.apply_rate(Rate::from_bps(500)); // 5%
    /// assert_eq!(commission.cents(), 5_000);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Splits the amount into `parts` shares that sum exactly to `self`.
    ///
    /// The remainder centavos go to the first share, so earlier
    /// installments are never smaller than later ones.
    ///
    /// ## Example
    /// ```rust
    /// use optica_core::money::Money;
    ///
    /// let shares = Money::from_cents(10_000).split(3);
    /// let cents: Vec<i64> = shares.iter().map(|m| m.cents()).collect();
    /// assert_eq!(cents, vec![3334, 3333, 3333]);
    /// ```
    ///
    /// Returns an empty vector when `parts` is zero.
    pub fn split(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let parts_i = parts as i64;
        let base = self.0 / parts_i;
        let remainder = self.0 - base * parts_i;

        (0..parts)
            .map(|i| {
                if i == 0 {
                    Money(base + remainder)
                } else {
                    Money(base)
                }
            })
            .collect()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display (`R$10.99`). Locale formatting belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${}.{:02}", sign, self.reais().abs(), self.cents_part())
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
