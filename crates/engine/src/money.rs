use std::{
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use crate::EngineError;

/// Signed money amount represented as **integer centavos**.
///
/// Use this type for **all** monetary values in the engine (amounts, limits,
/// totals) to avoid floating-point drift. Amounts are BRL.
///
/// The value is signed:
/// - positive = income / charge
/// - negative = refund / decrease
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "R$12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more than 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer centavos.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in centavos.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Plain two-decimal rendering without the currency symbol, as carried on
    /// the wire: `"300.00"`, `"-10.50"`.
    #[must_use]
    pub fn to_decimal_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}R${}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into centavos.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`. Rejects empty strings and more than 2 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty amount".to_string());
        let invalid = || EngineError::Validation("invalid amount".to_string());
        let overflow = || EngineError::Validation("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.replace(',', ".");
        let (whole_str, frac_str) = match rest.split_once('.') {
            None => (rest.as_str(), ""),
            Some((whole, frac)) => {
                if frac.contains('.') {
                    return Err(invalid());
                }
                (whole, frac)
            }
        };

        if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole_str.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            2 => frac_str.parse::<i64>().map_err(|_| invalid())?,
            _ => {
                return Err(EngineError::Validation("too many decimals".to_string()));
            }
        };

        let total = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}
