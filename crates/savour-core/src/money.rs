//! # Money Module
//!
//! Provides the `Money` type (pence) and the `VatMicros` accumulator used
//! for exact gross-price VAT extraction.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a VAT engine the stakes are worse: rounding each component's VAT    │
//! │  before summing compounds penny drift across the breakdown.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Pence + Micropence Accumulation                  │
//! │    Prices are i64 pence. VAT fractions accumulate as i128 micropence   │
//! │    (1 penny = 1,000,000 micropence) and round ONCE at the boundary.    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gross-Price VAT Extraction
//! All prices in the platform are VAT-INCLUSIVE (gross). For a gross amount
//! `G` taxed at rate `r` percent, the VAT portion is:
//!
//! ```text
//! vat = G * r / (100 + r)
//! ```
//!
//! NOT `G * r / 100`, which would double-count tax on a tax-inclusive price.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Micropence per penny. VAT fractions are held at this scale until the
/// public boundary, so intermediate additions never round.
const MICROS_PER_PENNY: i128 = 1_000_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in pence (smallest currency unit for GBP).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for the JSON VAT blobs on order rows
///
/// ## Where Money Flows
/// ```text
/// MenuItem.price_pence ──► MenuItemSnapshot ──► engine ──► VatBreakdown
/// ItemComponent.cost_pence ──► engine (per-component extraction)
/// VatBreakdown ──► order summary ──► receipt / HMRC report
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from pence.
    ///
    /// ## Example
    /// ```rust
    /// use savour_core::money::Money;
    ///
    /// let price = Money::from_pence(1250); // £12.50
    /// assert_eq!(price.pence(), 1250);
    /// ```
    #[inline]
    pub const fn from_pence(pence: i64) -> Self {
        Money(pence)
    }

    /// Creates a Money value from pounds and pence.
    ///
    /// ## Example
    /// ```rust
    /// use savour_core::money::Money;
    ///
    /// let price = Money::from_pounds_pence(12, 50); // £12.50
    /// assert_eq!(price.pence(), 1250);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the pounds unit should be negative.
    /// `from_pounds_pence(-5, 50)` = -£5.50, not -£4.50
    #[inline]
    pub const fn from_pounds_pence(pounds: i64, pence: i64) -> Self {
        if pounds < 0 {
            Money(pounds * 100 - pence)
        } else {
            Money(pounds * 100 + pence)
        }
    }

    /// Returns the value in pence.
    #[inline]
    pub const fn pence(&self) -> i64 {
        self.0
    }

    /// Returns the pounds portion.
    #[inline]
    pub const fn pounds(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the pence portion (always 0-99, absolute value).
    #[inline]
    pub const fn pence_part(&self) -> i64 {
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

    /// Extracts the VAT portion of this gross (VAT-inclusive) amount,
    /// un-rounded.
    ///
    /// ## The Extraction Formula
    /// ```text
    /// Gross: £12.00, rate 20%
    ///      │
    ///      ▼
    /// vat = G * r / (100 + r) = 12.00 * 20 / 120 = £2.00   ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Net £10.00 + VAT £2.00 reconstitutes the gross £12.00
    /// ```
    ///
    /// In basis points the formula is `pence * bps / (10_000 + bps)`; the
    /// result is scaled to micropence so callers can sum component VAT
    /// without intermediate rounding.
    ///
    /// ## Example
    /// ```rust
    /// use savour_core::money::Money;
    /// use savour_core::types::TaxRate;
    ///
    /// let gross = Money::from_pence(800); // £8.00 hot component
    /// let vat = gross.extract_vat_exact(TaxRate::STANDARD);
    /// // 8.00 * 20/120 = 1.3333... rounds to £1.33 at the boundary
    /// assert_eq!(vat.to_money().pence(), 133);
    /// ```
    pub fn extract_vat_exact(&self, rate: TaxRate) -> VatMicros {
        if rate.is_zero() {
            return VatMicros::zero();
        }
        let bps = rate.bps() as i128;
        // i128 keeps the scaled numerator far from overflow for any
        // realistic price
        VatMicros(self.0 as i128 * MICROS_PER_PENNY * bps / (10_000 + bps))
    }

    /// Extracts the VAT portion, rounded to whole pence.
    ///
    /// Convenience for single-amount callers; multi-component callers should
    /// accumulate [`VatMicros`] and round once.
    #[inline]
    pub fn extract_vat(&self, rate: TaxRate) -> Money {
        self.extract_vat_exact(rate).to_money()
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use savour_core::money::Money;
    ///
    /// let unit_vat = Money::from_pence(200); // £2.00 per unit
    /// let line_vat = unit_vat.multiply_quantity(2);
    /// assert_eq!(line_vat.pence(), 400); // £4.00
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// VatMicros Accumulator
// =============================================================================

/// An un-rounded VAT amount in micropence (1 penny = 1,000,000 micropence).
///
/// ## Why A Separate Type?
/// The numeric rule for this engine is: round to whole pence only at the
/// boundary of each public return value, never between intermediate
/// additions. Making the un-rounded representation a distinct type means the
/// compiler enforces that rule - a `VatMicros` cannot leak into a breakdown
/// without an explicit `to_money()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct VatMicros(i128);

impl VatMicros {
    /// Zero accumulator.
    #[inline]
    pub const fn zero() -> Self {
        VatMicros(0)
    }

    /// Wraps a raw micropence amount (engine-internal apportionment math).
    #[inline]
    pub(crate) const fn from_raw(micros: i128) -> Self {
        VatMicros(micros)
    }

    /// Raw micropence value (for tests and diagnostics).
    #[inline]
    pub const fn micros(&self) -> i128 {
        self.0
    }

    /// Checks if the accumulator is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Rounds to whole pence (half-up). This is the ONLY place a VAT
    /// fraction becomes reportable money.
    #[inline]
    pub const fn to_money(self) -> Money {
        // VAT amounts are non-negative by construction (costs and rates are
        // validated), so plain half-up rounding is sufficient
        Money::from_pence(((self.0 + MICROS_PER_PENNY / 2) / MICROS_PER_PENNY) as i64)
    }
}

impl Add for VatMicros {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        VatMicros(self.0 + other.0)
    }
}

impl AddAssign for VatMicros {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sum for VatMicros {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(VatMicros::zero(), Add::add)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This format is used verbatim in receipt display lines
/// (e.g. "Hot Food VAT (20%): £3.40").
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}£{}.{:02}", sign, self.pounds().abs(), self.pence_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money values (pre-rounded boundary values only).
impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
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
    fn test_from_pence() {
        let money = Money::from_pence(1250);
        assert_eq!(money.pence(), 1250);
        assert_eq!(money.pounds(), 12);
        assert_eq!(money.pence_part(), 50);
    }

    #[test]
    fn test_from_pounds_pence() {
        let money = Money::from_pounds_pence(12, 50);
        assert_eq!(money.pence(), 1250);

        let negative = Money::from_pounds_pence(-5, 50);
        assert_eq!(negative.pence(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_pence(1250)), "£12.50");
        assert_eq!(format!("{}", Money::from_pence(500)), "£5.00");
        assert_eq!(format!("{}", Money::from_pence(-550)), "-£5.50");
        assert_eq!(format!("{}", Money::from_pence(0)), "£0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pence(1000);
        let b = Money::from_pence(500);

        assert_eq!((a + b).pence(), 1500);
        assert_eq!((a - b).pence(), 500);
        assert_eq!((a * 3).pence(), 3000);
        assert_eq!(a.multiply_quantity(2).pence(), 2000);
    }

    #[test]
    fn test_extract_vat_standard_rate() {
        // £12.00 gross at 20% = 12 * 20/120 = £2.00
        let gross = Money::from_pence(1200);
        assert_eq!(gross.extract_vat(TaxRate::STANDARD).pence(), 200);
    }

    #[test]
    fn test_extract_vat_rounds_at_boundary_only() {
        // £8.00 gross at 20% = 1.3333... -> £1.33
        let gross = Money::from_pence(800);
        let exact = gross.extract_vat_exact(TaxRate::STANDARD);
        assert_eq!(exact.micros(), 133_333_333);
        assert_eq!(exact.to_money().pence(), 133);
    }

    #[test]
    fn test_zero_rate_extracts_nothing() {
        for pence in [0, 1, 399, 1200, 99_999] {
            let gross = Money::from_pence(pence);
            assert!(gross.extract_vat_exact(TaxRate::ZERO).is_zero());
        }
    }

    /// Property: net + VAT must reconstitute the gross within 1p.
    #[test]
    fn test_gross_vat_identity() {
        for pence in [1, 99, 100, 1200, 1333, 98_765] {
            for rate in [TaxRate::ZERO, TaxRate::STANDARD] {
                let gross = Money::from_pence(pence);
                let vat = gross.extract_vat(rate).pence();
                // net = G / (1 + r/100) = G * 10000 / (10000 + bps)
                let net = pence as i128 * 10_000 / (10_000 + rate.bps() as i128);
                let reconstituted = net as i64 + vat;
                assert!(
                    (reconstituted - pence).abs() <= 1,
                    "gross {pence} at {rate:?}: net {net} + vat {vat} drifted"
                );
            }
        }
    }

    #[test]
    fn test_micros_accumulate_before_rounding() {
        // Two components at 1.3333... each: summed un-rounded then rounded
        // once gives 267p, not 266p (which per-component rounding would give)
        let each = Money::from_pence(800).extract_vat_exact(TaxRate::STANDARD);
        let total = each + each;
        assert_eq!(total.to_money().pence(), 267);
    }

    #[test]
    fn test_micros_sum() {
        let parts = vec![
            Money::from_pence(800).extract_vat_exact(TaxRate::STANDARD),
            Money::from_pence(400).extract_vat_exact(TaxRate::ZERO),
        ];
        let total: VatMicros = parts.into_iter().sum();
        assert_eq!(total.to_money().pence(), 133);
    }
}
