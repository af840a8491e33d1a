#![forbid(unsafe_code)]
#![warn(missing_debug_implementations, rust_2018_idioms)]

//! # zigQuant-Decimal
//!
//! A 128-bit scaled fixed-point [`Decimal`] used for prices, sizes and P&L
//! throughout zigQuant. Every value shares the same implicit scale (18
//! decimal digits); arithmetic never changes scale, division fails rather
//! than panics on a zero divisor, and the last retained digit is truncated
//! toward zero rather than rounded.

use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
    str::FromStr,
};
use thiserror::Error;

/// Number of decimal digits retained after the point, repository-wide.
pub const SCALE: u32 = 18;

const SCALE_FACTOR: i128 = 1_000_000_000_000_000_000i128;

/// Errors produced by fallible [`Decimal`] operations.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DecimalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("decimal arithmetic overflowed")]
    Overflow,

    #[error("invalid decimal literal: {0}")]
    InvalidLiteral(String),
}

/// A 128-bit scaled fixed-point number. `value` is the integer representation
/// with an implicit scale of [`SCALE`] decimal digits, e.g. the raw value
/// `1_500_000_000_000_000_000` represents `1.5`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Decimal {
    value: i128,
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Decimal::from_str(&raw).map_err(DeError::custom)
    }
}

impl Decimal {
    pub const ZERO: Decimal = Decimal { value: 0 };
    pub const ONE: Decimal = Decimal {
        value: SCALE_FACTOR,
    };

    /// Constructs a `Decimal` from a signed integer (exact, no fraction).
    pub fn from_int(value: i64) -> Self {
        Decimal {
            value: value as i128 * SCALE_FACTOR,
        }
    }

    /// Constructs a `Decimal` from a `f64`. Lossy: binary floating point
    /// cannot exactly represent most decimal fractions, so the result is
    /// rounded to the nearest representable scaled value. Prefer
    /// [`Decimal::from_string`] wherever the source is textual.
    pub fn from_float(value: f64) -> Result<Self, DecimalError> {
        if !value.is_finite() {
            return Err(DecimalError::InvalidLiteral(value.to_string()));
        }
        let scaled = value * SCALE_FACTOR as f64;
        if scaled > i128::MAX as f64 || scaled < i128::MIN as f64 {
            return Err(DecimalError::Overflow);
        }
        Ok(Decimal {
            value: scaled.round() as i128,
        })
    }

    /// Parses a decimal literal such as `"-123.456000"`. Fractional digits
    /// beyond [`SCALE`] are truncated toward zero rather than rounded.
    pub fn from_string(input: &str) -> Result<Self, DecimalError> {
        Decimal::from_str(input)
    }

    /// Returns `true` if this value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Returns `true` if this value is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    /// Returns `true` if this value is strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.value < 0
    }

    /// Returns the sign of this value as `-1`, `0`, or `1`.
    pub fn signum(&self) -> i32 {
        self.value.signum() as i32
    }

    /// Returns the absolute value.
    pub fn abs(&self) -> Self {
        Decimal {
            value: self.value.abs(),
        }
    }

    /// The raw scaled integer representation. Exposed for adapters that need
    /// to serialise to an exchange-specific wire format.
    pub fn raw(&self) -> i128 {
        self.value
    }

    /// Largest integral `Decimal` less than or equal to `self`.
    pub fn floor(&self) -> Self {
        let rem = self.value.rem_euclid(SCALE_FACTOR);
        Decimal {
            value: self.value - rem,
        }
    }

    /// Checked addition; fails only on overflow of the underlying `i128`.
    pub fn checked_add(self, rhs: Self) -> Result<Self, DecimalError> {
        self.value
            .checked_add(rhs.value)
            .map(|value| Decimal { value })
            .ok_or(DecimalError::Overflow)
    }

    /// Checked subtraction; fails only on overflow of the underlying `i128`.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, DecimalError> {
        self.value
            .checked_sub(rhs.value)
            .map(|value| Decimal { value })
            .ok_or(DecimalError::Overflow)
    }

    /// Checked multiplication via a 256-bit intermediate product, preserving
    /// scale by dividing the product by `10^SCALE`.
    pub fn checked_mul(self, rhs: Self) -> Result<Self, DecimalError> {
        let sign = self.signum() as i128 * rhs.signum() as i128;
        if sign == 0 {
            return Ok(Decimal::ZERO);
        }

        let (hi, lo) = widening_mul(self.value.unsigned_abs(), rhs.value.unsigned_abs());
        let (quot_hi, quot_lo, _rem) = div_u256_by_u128(hi, lo, SCALE_FACTOR as u128);

        if quot_hi != 0 || quot_lo > i128::MAX as u128 {
            return Err(DecimalError::Overflow);
        }

        Ok(Decimal {
            value: sign * quot_lo as i128,
        })
    }

    /// Checked division. The numerator is scaled by `10^SCALE` before
    /// integer division so the quotient preserves scale. Returns
    /// [`DecimalError::DivisionByZero`] rather than panicking.
    pub fn checked_div(self, rhs: Self) -> Result<Self, DecimalError> {
        if rhs.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }

        let sign = self.signum() as i128 * rhs.signum() as i128;
        if sign == 0 {
            return Ok(Decimal::ZERO);
        }

        let (hi, lo) = widening_mul(self.value.unsigned_abs(), SCALE_FACTOR as u128);
        let (quot_hi, quot_lo, _rem) = div_u256_by_u128(hi, lo, rhs.value.unsigned_abs());

        if quot_hi != 0 || quot_lo > i128::MAX as u128 {
            return Err(DecimalError::Overflow);
        }

        Ok(Decimal {
            value: sign * quot_lo as i128,
        })
    }

    /// Integer-square-root of the scaled value, computed by Newton's method
    /// over the 256-bit intermediate `value * 10^SCALE` so that the result
    /// preserves scale (`sqrt(value/10^s) * 10^s = sqrt(value * 10^s)`).
    /// Fails on negative inputs rather than returning a complex result.
    pub fn checked_sqrt(self) -> Result<Self, DecimalError> {
        if self.is_negative() {
            return Err(DecimalError::InvalidLiteral("sqrt of negative decimal".into()));
        }
        if self.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let (hi, lo) = widening_mul(self.value as u128, SCALE_FACTOR as u128);

        // `self.value` fits in i128 (<= 2^127) and SCALE_FACTOR < 2^60, so
        // the 256-bit product's root is always well under 2^127: a starting
        // guess of `2^127 - 1` is both a valid divisor (the invariant
        // `div_u256_by_u128` requires) and always >= the true root, which
        // is what Newton's method needs to converge monotonically downward.
        let mut guess: u128 = (1u128 << 127) - 1;
        loop {
            let (quot_hi, quot_lo, _rem) = div_u256_by_u128(hi, lo, guess);
            debug_assert_eq!(quot_hi, 0, "sqrt guess underflowed divisor invariant");
            // Overflow-free average of `guess` and `quot_lo`.
            let next = (guess & quot_lo) + ((guess ^ quot_lo) >> 1);
            if next >= guess {
                break;
            }
            guess = next;
        }

        if guess > i128::MAX as u128 {
            return Err(DecimalError::Overflow);
        }
        Ok(Decimal { value: guess as i128 })
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Decimal::ZERO
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs)
            .expect("Decimal addition overflowed")
    }
}

impl Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs)
            .expect("Decimal subtraction overflowed")
    }
}

impl Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Self) -> Self::Output {
        self.checked_mul(rhs)
            .expect("Decimal multiplication overflowed")
    }
}

impl Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Self) -> Self::Output {
        self.checked_div(rhs)
            .expect("Decimal division failed (zero divisor or overflow)")
    }
}

impl Decimal {
    /// Panicking convenience wrapper over [`Decimal::checked_sqrt`].
    pub fn sqrt(self) -> Self {
        self.checked_sqrt().expect("Decimal sqrt of a negative value")
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Self::Output {
        Decimal { value: -self.value }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let magnitude = self.value.unsigned_abs();
        let integer_part = magnitude / SCALE_FACTOR as u128;
        let frac_part = magnitude % SCALE_FACTOR as u128;

        if frac_part == 0 {
            write!(f, "{sign}{integer_part}")
        } else {
            let mut frac_str = format!("{:0width$}", frac_part, width = SCALE as usize);
            while frac_str.ends_with('0') {
                frac_str.pop();
            }
            write!(f, "{sign}{integer_part}.{frac_str}")
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DecimalError::InvalidLiteral(input.to_string()));
        }

        let (negative, rest) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };

        let mut parts = rest.splitn(2, '.');
        let integer_str = parts.next().unwrap_or("");
        let frac_str = parts.next();

        let frac_is_empty = frac_str.map(str::is_empty).unwrap_or(true);
        if integer_str.is_empty() && frac_is_empty {
            return Err(DecimalError::InvalidLiteral(input.to_string()));
        }
        if !integer_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(DecimalError::InvalidLiteral(input.to_string()));
        }

        let integer_value: i128 = if integer_str.is_empty() {
            0
        } else {
            integer_str
                .parse()
                .map_err(|_| DecimalError::InvalidLiteral(input.to_string()))?
        };

        let mut frac_value: i128 = 0;
        if let Some(frac_str) = frac_str {
            if !frac_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(DecimalError::InvalidLiteral(input.to_string()));
            }
            // Truncate digits beyond SCALE toward zero rather than rounding.
            let truncated: String = frac_str.chars().take(SCALE as usize).collect();
            let padded = format!("{truncated:0<width$}", width = SCALE as usize);
            frac_value = padded
                .parse()
                .map_err(|_| DecimalError::InvalidLiteral(input.to_string()))?;
        }

        let magnitude = integer_value
            .checked_mul(SCALE_FACTOR)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or(DecimalError::Overflow)?;

        Ok(Decimal {
            value: if negative { -magnitude } else { magnitude },
        })
    }
}

/// Widens a 128x128-bit unsigned multiplication into a 256-bit `(high, low)`
/// pair, avoiding overflow for the scaled products [`Decimal::checked_mul`]
/// and [`Decimal::checked_div`] require.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    const MASK64: u128 = u64::MAX as u128;

    let a0 = a & MASK64;
    let a1 = a >> 64;
    let b0 = b & MASK64;
    let b1 = b >> 64;

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let r0 = p00 & MASK64;
    let c0 = p00 >> 64;

    let sum1 = (p01 & MASK64) + (p10 & MASK64) + c0;
    let r1 = sum1 & MASK64;
    let c1 = sum1 >> 64;

    let sum2 = (p01 >> 64) + (p10 >> 64) + (p11 & MASK64) + c1;
    let r2 = sum2 & MASK64;
    let c2 = sum2 >> 64;

    let sum3 = (p11 >> 64) + c2;
    let r3 = sum3 & MASK64;

    let low = r0 | (r1 << 64);
    let high = r2 | (r3 << 64);
    (high, low)
}

/// Divides the unsigned 256-bit value `hi * 2^128 + lo` by `divisor` via
/// binary long division. Callers must ensure `divisor <= 2^127` (true for
/// every call site here: either `SCALE_FACTOR` or `abs(i128)`), otherwise the
/// running remainder's left-shift could overflow `u128`.
fn div_u256_by_u128(hi: u128, lo: u128, divisor: u128) -> (u128, u128, u128) {
    let mut rem: u128 = 0;
    let mut quot_hi: u128 = 0;
    let mut quot_lo: u128 = 0;

    for i in (0..256).rev() {
        let bit = if i >= 128 {
            (hi >> (i - 128)) & 1
        } else {
            (lo >> i) & 1
        };
        rem = (rem << 1) | bit;
        if rem >= divisor {
            rem -= divisor;
            if i >= 128 {
                quot_hi |= 1u128 << (i - 128);
            } else {
                quot_lo |= 1u128 << i;
            }
        }
    }

    (quot_hi, quot_lo, rem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_and_display_round_trip() {
        let d = Decimal::from_string("123.450000").unwrap();
        assert_eq!(d.to_string(), "123.45");

        let d = Decimal::from_string("-0.5").unwrap();
        assert_eq!(d.to_string(), "-0.5");

        let d = Decimal::from_string("42").unwrap();
        assert_eq!(d.to_string(), "42");
    }

    #[test]
    fn from_string_truncates_excess_fraction_digits() {
        let d = Decimal::from_string("1.1234567890123456789999").unwrap();
        assert_eq!(d.to_string(), "1.123456789012345678");
    }

    #[test]
    fn from_string_rejects_garbage() {
        assert!(Decimal::from_string("").is_err());
        assert!(Decimal::from_string("abc").is_err());
        assert!(Decimal::from_string("1.2.3").is_err());
    }

    #[test]
    fn add_sub_preserve_scale() {
        let a = Decimal::from_string("10.5").unwrap();
        let b = Decimal::from_string("2.25").unwrap();
        assert_eq!((a + b).to_string(), "12.75");
        assert_eq!((a - b).to_string(), "8.25");
    }

    #[test]
    fn mul_uses_256_bit_intermediate_without_overflow() {
        let a = Decimal::from_string("12345678901234.123456").unwrap();
        let b = Decimal::from_string("98765432109876.987654").unwrap();
        let product = a.checked_mul(b).unwrap();
        // Sanity: magnitude should land in the expected ballpark, not wrap.
        assert!(product.is_positive());
        assert!(product.to_string().starts_with("1219326311370"));
    }

    #[test]
    fn div_truncates_toward_zero() {
        let ten = Decimal::from_int(10);
        let three = Decimal::from_int(3);
        let result = (ten / three).to_string();
        assert_eq!(result, "3.333333333333333333");
    }

    #[test]
    fn div_by_zero_is_an_error_not_a_panic() {
        let a = Decimal::from_int(1);
        assert_eq!(
            a.checked_div(Decimal::ZERO).unwrap_err(),
            DecimalError::DivisionByZero
        );
    }

    #[test]
    fn negative_division_rounds_sign_correctly() {
        let a = Decimal::from_int(-7);
        let b = Decimal::from_int(2);
        assert_eq!((a / b).to_string(), "-3.5");
    }

    #[test]
    fn ordering_matches_numeric_value() {
        let a = Decimal::from_string("1.5").unwrap();
        let b = Decimal::from_string("1.50001").unwrap();
        assert!(a < b);
        assert!(Decimal::from_int(-1) < Decimal::ZERO);
    }

    #[test]
    fn sign_predicates_and_abs() {
        let neg = Decimal::from_int(-5);
        assert!(neg.is_negative());
        assert!(!neg.is_positive());
        assert_eq!(neg.abs(), Decimal::from_int(5));
        assert!(Decimal::ZERO.is_zero());
    }

    #[test]
    fn sqrt_of_perfect_square_is_exact() {
        assert_eq!(Decimal::from_int(9).sqrt(), Decimal::from_int(3));
        assert_eq!(Decimal::from_int(0).sqrt(), Decimal::ZERO);
        assert_eq!(Decimal::from_int(1).sqrt(), Decimal::from_int(1));
    }

    #[test]
    fn sqrt_of_non_perfect_square_truncates_toward_zero() {
        // sqrt(2) = 1.41421356237309504880..., floored at 18 fractional digits.
        let result = Decimal::from_int(2).checked_sqrt().unwrap();
        assert_eq!(result.to_string(), "1.414213562373095048");
    }

    #[test]
    fn sqrt_of_negative_is_an_error() {
        assert!(Decimal::from_int(-4).checked_sqrt().is_err());
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(Decimal::from_string("1.9").unwrap().floor(), Decimal::from_int(1));
        assert_eq!(Decimal::from_string("-1.1").unwrap().floor(), Decimal::from_int(-2));
        assert_eq!(Decimal::from_int(5).floor(), Decimal::from_int(5));
    }

    #[test]
    fn serde_round_trips_through_string() {
        let d = Decimal::from_string("2000.0").unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, "\"2000\"");
        let back: Decimal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
