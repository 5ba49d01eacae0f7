//! # Money Module
//!
//! Provides the `Money` type for handling rupee amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The interpreter hands us prices like 30.1 and 0.2                      │
//! │    30.1 × 3 = 90.30000000000001  ❌ WRONG!                              │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    "30.1" is parsed from its decimal text → 3010 paise                  │
//! │    3010 × 3 = 9030 paise = ₹90.30 exactly                               │
//! │                                                                         │
//! │  Revenue, COGS and gross profit are all sums of integer products,       │
//! │  so  gross_profit == total_amount - total_cogs  holds bit-for-bit.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bahi_core::money::Money;
//!
//! let price = Money::from_paise(3050);          // ₹30.50
//! let line = price.checked_multiply_quantity(2); // ₹61
//! assert_eq!(line.map(|m| m.paise()), Some(6100));
//!
//! let parsed = Money::parse_major("30.5").unwrap();
//! assert_eq!(parsed, price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: gross profit can be negative when selling below cost
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as paise**: storage and API both carry the integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use bahi_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(150).paise(), 15000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Parses a non-negative decimal amount in rupees ("30", "30.5", "1200.00").
    ///
    /// ## Rules
    /// - Digits with at most one `.` and at most two fractional digits
    /// - No sign, no exponent, no thousands separators
    /// - Must fit in i64 paise
    ///
    /// The value is built from the decimal text directly, never through f64.
    pub fn parse_major(text: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let text = text.trim();
        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a non-negative decimal number"));
        }
        if frac.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let rupees: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount is too large"))?
        };
        let paise_part: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => frac.parse().map_err(|_| invalid("must be a number"))?,
        };

        rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise_part))
            .map(Money)
            .ok_or_else(|| invalid("amount is too large"))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use bahi_core::money::Money;
    ///
    /// let unit_price = Money::from_rupees(30);
    /// assert_eq!(unit_price.checked_multiply_quantity(5), Some(Money::from_rupees(150)));
    /// assert_eq!(Money::from_paise(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(paise) => Some(Money(paise)),
            None => None,
        }
    }

    /// Formats as a plain decimal rupee string ("30.50"), used when talking
    /// to the interpreter.
    pub fn to_major_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows `₹150` for whole amounts and `₹150.50` otherwise.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        if self.paise_part() == 0 {
            write!(f, "{}₹{}", sign, self.rupees().abs())
        } else {
            write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
        }
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Major-Unit Serde Adapter
// =============================================================================

/// Serde adapter for optional amounts expressed in rupees.
///
/// The interpreter speaks rupees (`"sellingPrice": 30.5`), while the rest of
/// the system speaks paise. Accepts JSON numbers or numeric strings and routes
/// both through [`Money::parse_major`].
///
/// ```rust,ignore
/// #[serde(default, with = "crate::money::rupees_opt")]
/// pub selling_price: Option<Money>,
/// ```
pub mod rupees_opt {
    use super::Money;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(serde_json::Number),
        Text(String),
    }

    pub fn serialize<S>(value: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(money) => serializer.serialize_str(&money.to_major_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawAmount> = Option::deserialize(deserializer)?;
        let text = match raw {
            None => return Ok(None),
            Some(RawAmount::Number(n)) => n.to_string(),
            Some(RawAmount::Text(s)) => s,
        };
        Money::parse_major(&text).map(Some).map_err(de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(15050);
        assert_eq!(money.paise(), 15050);
        assert_eq!(money.rupees(), 150);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_checked_arithmetic_stops_at_overflow() {
        let big = Money::from_paise(i64::MAX / 2 + 1);
        assert_eq!(big.checked_multiply_quantity(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::from_paise(i64::MIN).checked_sub(Money::from_paise(1)), None);
        assert_eq!(
            Money::from_rupees(20).checked_sub(Money::from_rupees(25)),
            Some(Money::from_rupees(-5))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupees(150).to_string(), "₹150");
        assert_eq!(Money::from_paise(3050).to_string(), "₹30.50");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0");
    }

    #[test]
    fn test_parse_major() {
        assert_eq!(Money::parse_major("30").unwrap().paise(), 3000);
        assert_eq!(Money::parse_major("30.5").unwrap().paise(), 3050);
        assert_eq!(Money::parse_major("30.05").unwrap().paise(), 3005);
        assert_eq!(Money::parse_major("1200.00").unwrap().paise(), 120000);
        assert_eq!(Money::parse_major(".5").unwrap().paise(), 50);
        assert_eq!(Money::parse_major(" 0 ").unwrap().paise(), 0);
    }

    #[test]
    fn test_parse_major_rejects_bad_input() {
        assert!(Money::parse_major("").is_err());
        assert!(Money::parse_major(".").is_err());
        assert!(Money::parse_major("-5").is_err());
        assert!(Money::parse_major("1e3").is_err());
        assert!(Money::parse_major("30.555").is_err());
        assert!(Money::parse_major("1,200").is_err());
        assert!(Money::parse_major("abc").is_err());
        assert!(Money::parse_major("99999999999999999999").is_err());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_rupees(10);
        let b = Money::from_rupees(4);
        assert_eq!(a + b, Money::from_rupees(14));
        assert_eq!(b - a, Money::from_rupees(-6));
        assert!((b - a).is_negative());

        let total: Money = vec![a, b, Money::from_paise(50)].into_iter().sum();
        assert_eq!(total.paise(), 1450);
    }

    #[test]
    fn test_rupees_opt_adapter() {
        #[derive(serde::Deserialize, serde::Serialize)]
        struct Holder {
            #[serde(default, with = "rupees_opt")]
            price: Option<Money>,
        }

        let h: Holder = serde_json::from_str(r#"{"price": 30.5}"#).unwrap();
        assert_eq!(h.price, Some(Money::from_paise(3050)));

        let h: Holder = serde_json::from_str(r#"{"price": "12"}"#).unwrap();
        assert_eq!(h.price, Some(Money::from_rupees(12)));

        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(h.price, None);

        let h: Holder = serde_json::from_str(r#"{"price": null}"#).unwrap();
        assert_eq!(h.price, None);

        assert!(serde_json::from_str::<Holder>(r#"{"price": -3}"#).is_err());

        let json = serde_json::to_string(&Holder { price: Some(Money::from_paise(3050)) }).unwrap();
        assert_eq!(json, r#"{"price":"30.50"}"#);
    }
}
