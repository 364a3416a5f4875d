//! # Money
//!
//! Fixed-point amounts with two decimal places, counted in cents.
//!
//! Amounts arrive as decimal strings from forms and fixtures, and leave as
//! strings with exactly two decimals (`"1250.00"`). Floats are rejected on
//! deserialization: a float cannot carry a currency amount exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountError;

/// Number of digits after the decimal point.
pub const DECIMAL_PLACES: usize = 2;

/// A currency amount in cents. May be negative (refunds, corrections).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(0);

    /// Construct from a cent count.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Construct from whole currency units.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(100).map(Self)
    }

    /// The amount in cents.
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a decimal string with no limit on the number of digits.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        parse_decimal(s, None)
    }

    /// Parse a decimal string holding at most `max_digits` significant digits,
    /// two of which are reserved for the fractional part.
    pub fn parse_with_max_digits(s: &str, max_digits: usize) -> Result<Self, AmountError> {
        parse_decimal(s, Some(max_digits))
    }

    /// Add two amounts, clamping at the `i64` bounds.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// `percent`% of this amount, rounded half away from zero to whole cents.
    pub fn percent(self, percent: u8) -> Money {
        let scaled = i128::from(self.0) * i128::from(percent);
        let magnitude = (scaled.abs() + 50) / 100;
        let signed = if scaled < 0 { -magnitude } else { magnitude };
        // |self| * 100 / 100 never exceeds |self|, so this always fits.
        Money(signed as i64)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl<'a> std::iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl std::str::FromStr for Money {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Whole(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Money::parse(&s).map_err(serde::de::Error::custom),
            Raw::Whole(units) => Money::from_units(units)
                .ok_or_else(|| serde::de::Error::custom(AmountError::Overflow)),
        }
    }
}

fn parse_decimal(s: &str, max_digits: Option<usize>) -> Result<Money, AmountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    let (negative, unsigned) = match s.as_bytes()[0] {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (whole, frac) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::NotANumber(s.to_string()));
    }

    // Trailing zeros carry no precision: "1.500" is 1.50.
    let frac = frac.trim_end_matches('0');
    if frac.len() > DECIMAL_PLACES {
        return Err(AmountError::TooManyDecimalPlaces {
            max: DECIMAL_PLACES,
        });
    }

    let whole = whole.trim_start_matches('0');
    if let Some(max) = max_digits {
        let max_whole = max.saturating_sub(DECIMAL_PLACES);
        if whole.len() > max_whole || whole.len() + frac.len() > max {
            return Err(AmountError::TooManyDigits { max });
        }
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let frac_value: i64 = match frac.len() {
        0 => 0,
        1 => i64::from(frac.as_bytes()[0] - b'0') * 10,
        _ => frac.parse().map_err(|_| AmountError::NotANumber(s.to_string()))?,
    };

    let cents = whole_value
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or(AmountError::Overflow)?;

    Ok(Money(if negative { -cents } else { cents }))
}
