use std::{
    fmt,
    ops::{Add, AddAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Money amount represented as **integer cents**.
///
/// Every expense value goes through this type so that totals never drift the
/// way floating point sums do.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(amount.with_currency("€"), "€ 12.34");
/// ```
///
/// Parsing from user input accepts both European and plain notation. When a
/// `,` is present every `.` is a thousands separator:
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("12,50".parse::<MoneyCents>().unwrap().cents(), 1250);
/// assert_eq!("1.234,56".parse::<MoneyCents>().unwrap().cents(), 123_456);
/// assert_eq!("12.50".parse::<MoneyCents>().unwrap().cents(), 1250);
/// assert!("abc".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Formats the amount prefixed by a currency symbol, e.g. `€ 12.50`.
    pub fn with_currency(self, currency: &str) -> String {
        if currency.is_empty() {
            self.to_string()
        } else {
            format!("{currency} {self}")
        }
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Whitespace is ignored and an optional leading `+`/`-` is accepted.
    /// If the input contains a `,` it is the decimal separator and every `.`
    /// is dropped as a thousands separator; otherwise `.` is the decimal
    /// separator.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("\"{s}\" is not a number"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = compact.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = compact.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, compact.as_str())
        };
        if rest.is_empty() {
            return Err(empty());
        }

        let normalized = if rest.contains(',') {
            rest.replace('.', "").replacen(',', ".", 1)
        } else {
            rest.to_string()
        };

        let mut parts = normalized.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let cents_str = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if units_str.is_empty() && cents_str.is_none_or(str::is_empty) {
            return Err(invalid());
        }

        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| overflow())?
        };

        let cents: i64 = match cents_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::InvalidAmount("too many decimals".to_string())),
                }
            }
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;

        Ok(MoneyCents(if negative { -total } else { total }))
    }
}
