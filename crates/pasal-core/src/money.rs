//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Paisa?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  VAT reversal makes it worse:                                           │
//! │    Rs. 113 / 1.13 = 99.99999999999999                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paisa (1 rupee = 100 paisa)                      │
//! │    11300 paisa × 10000 / 11300 = 10000 paisa, exactly                   │
//! │    Every division rounds half-up to the paisa, explicitly               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pasal_core::money::Money;
//!
//! let price = Money::from_paisa(9950); // Rs. 99.50
//! let doubled = price * 2;             // Rs. 199.00
//! let total = price + Money::from_rupees(10); // Rs. 109.50
//! assert_eq!(total.paisa(), 10950);
//! assert_eq!(doubled.paisa(), 19900);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
pub(crate) const BPS_SCALE: i128 = 10_000;

/// Divides `num / den`, rounding half away from zero.
///
/// `den` must be positive.
pub(crate) fn div_round_half_up(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0);
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paisa, the smallest unit of the Nepalese rupee.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences and refunds can be negative
/// - **Single field tuple struct**: zero-cost over i64, serialises as a number
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► LineItem.unit_price ──► line subtotal
///                                               │
///                   item discount ◄─────────────┤
///                   cart discount ◄─────────────┤
///                                               ▼
///                   PricingResult.grand_total ──► Payment.amount
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paisa.
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    ///
    /// let price = Money::from_paisa(11300); // Rs. 113.00
    /// assert_eq!(price.paisa(), 11300);
    /// ```
    #[inline]
    pub const fn from_paisa(paisa: i64) -> Self {
        Money(paisa)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Creates a Money value from rupees and paisa.
    ///
    /// For negative amounts only the rupee part carries the sign:
    /// `from_rupees_paisa(-5, 50)` is -Rs. 5.50.
    #[inline]
    pub const fn from_rupees_paisa(rupees: i64, paisa: i64) -> Self {
        if rupees < 0 {
            Money(rupees * 100 - paisa)
        } else {
            Money(rupees * 100 + paisa)
        }
    }

    /// Returns the value in paisa.
    #[inline]
    pub const fn paisa(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paisa portion, always 0-99.
    #[inline]
    pub const fn paisa_part(&self) -> i64 {
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    ///
    /// assert_eq!(Money::from_paisa(-250).non_negative(), Money::zero());
    /// assert_eq!(Money::from_paisa(250).non_negative().paisa(), 250);
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    ///
    /// let unit_price = Money::from_paisa(4500); // Rs. 45 (Wai Wai packet)
    /// assert_eq!(unit_price.multiply_quantity(3).paisa(), 13500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns `bps` basis points of this amount, rounded half-up to the paisa.
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    ///
    /// let subtotal = Money::from_rupees(200);
    /// // 10% = 1000 bps
    /// assert_eq!(subtotal.percentage(1000), Money::from_rupees(20));
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let amount = div_round_half_up(self.0 as i128 * bps as i128, BPS_SCALE);
        Money(amount as i64)
    }

    /// Adds tax on top of this amount (tax-exclusive pricing).
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    /// use pasal_core::types::TaxRate;
    ///
    /// let price = Money::from_rupees(100);
    /// assert_eq!(price.calculate_tax(TaxRate::from_bps(1300)), Money::from_rupees(13));
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.percentage(rate.bps())
    }

    /// Reverses the tax out of a tax-inclusive amount.
    ///
    /// ## Formula
    /// ```text
    /// pre_tax = round(amount × 10000 / (10000 + rate_bps))
    /// tax     = amount − pre_tax
    /// ```
    ///
    /// Rounding happens once, on the pre-tax figure, so
    /// `pre_tax + tax == amount` always holds.
    ///
    /// ```rust
    /// use pasal_core::money::Money;
    /// use pasal_core::types::TaxRate;
    ///
    /// // Rs. 113 at 13% VAT contains Rs. 13 of tax
    /// let tax = Money::from_rupees(113).extract_inclusive_tax(TaxRate::from_bps(1300));
    /// assert_eq!(tax, Money::from_rupees(13));
    /// ```
    pub fn extract_inclusive_tax(&self, rate: TaxRate) -> Money {
        if rate.is_zero() {
            return Money::zero();
        }
        let pre_tax = div_round_half_up(
            self.0 as i128 * BPS_SCALE,
            BPS_SCALE + rate.bps() as i128,
        );
        Money(self.0 - pre_tax as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `Rs. 1234.50`.
///
/// Debug/CLI formatting only; front ends apply their own locale formatting
/// (lakh grouping, Devanagari digits).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}Rs. {}.{:02}",
            sign,
            self.rupees().abs(),
            self.paisa_part()
        )
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
