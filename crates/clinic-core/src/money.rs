//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Integer Centavos
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount in the clinic is stored as whole centavos (i64).          │
//! │                                                                         │
//! │    ₱1,500.00  →  150000                                                 │
//! │    12% VAT    →  (150000 × 1200 + 5000) / 10000 = 18000                 │
//! │                                                                         │
//! │  Bill amounts, procedure costs, product prices, sale totals and         │
//! │  invoice tax all go through this type.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use clinic_core::money::Money;
//!
//! let consult = Money::parse("1,500.50").unwrap();
//! assert_eq!(consult.cents(), 150_050);
//! assert_eq!(consult.to_string(), "1500.50");
//! assert_eq!(consult.format_with("₱"), "₱1,500.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos for PHP).
///
/// Signed so corrections and stock write-offs can go negative; the
/// validators reject negative amounts where a form requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// let fee = Money::from_cents(25_000); // ₱250.00
    /// assert_eq!(fee.cents(), 25_000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses an amount typed by an operator.
    ///
    /// Accepts an optional leading `-`, thousands separators (`,`) and
    /// up to two decimal places: `"1500"`, `"1,500.5"`, `"99.95"`.
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if major_str.is_empty() && minor_str.is_empty()
            || !all_digits(major_str)
            || !all_digits(minor_str)
            || minor_str.len() > 2
        {
            return Err(ValidationError::invalid(
                "amount",
                format!("'{}' is not a valid amount", input.trim()),
            ));
        }

        let overflow = || ValidationError::invalid("amount", "amount is too large");
        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| overflow())?
        };
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => minor_str.parse().map_err(|_| overflow())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pesos) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
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

    /// Calculates tax at the given rate, rounding half up.
    ///
    /// Integer math: `(amount * bps + 5000) / 10000`, carried out in
    /// i128 so large totals can't overflow.
    ///
    /// ```rust
    /// use clinic_core::money::Money;
    /// use clinic_core::types::TaxRate;
    ///
    /// let total = Money::from_cents(1_000); // ₱10.00
    /// let tax = total.calculate_tax(TaxRate::from_bps(1200));
    /// assert_eq!(tax.cents(), 120);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Multiplies a unit price by a quantity, saturating at the i64 bounds.
    ///
    /// Display only. Totals that get stored go through
    /// [`checked_multiply_quantity`](Self::checked_multiply_quantity).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Unit price × quantity, or `None` on overflow.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Formats with a currency symbol and thousands separators.
    ///
    /// ```rust
    /// use clinic_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(123_456_789).format_with("₱"), "₱1,234,567.89");
    /// assert_eq!(Money::from_cents(-550).format_with("₱"), "-₱5.50");
    /// ```
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let major = self.major().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (i, ch) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!("{}{}{}.{:02}", sign, symbol, grouped, self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering without a currency symbol.
/// Use [`Money::format_with`] for operator-facing output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            self.major().unsigned_abs(),
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
