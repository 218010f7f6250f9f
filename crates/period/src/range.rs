//! Inclusive year ranges and their `"YYYY-YYYY"` string form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// An inclusive range of calendar years, e.g. `1995-2014`.
///
/// The string form accepts anything whose two dash-separated sides start
/// with four digits, so `"185001-201412"` and `"1850-2014"` both parse to
/// `1850-2014`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Creates a range from its first and last years.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::ReversedRange`] if `end < start`.
    pub fn new(start: i32, end: i32) -> Result<Self, PeriodError> {
        if end < start {
            return Err(PeriodError::ReversedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range between two years given in any order.
    pub fn spanning(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Creates the range of `len` years starting at `start`.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::ReversedRange`] if `len` is zero and
    /// [`PeriodError::InvalidPeriod`] if the last year does not fit an `i32`.
    pub fn starting_at(start: i32, len: u32) -> Result<Self, PeriodError> {
        if len == 0 {
            return Err(PeriodError::ReversedRange {
                start,
                end: start.saturating_sub(1),
            });
        }
        let end = i32::try_from(i64::from(start) + i64::from(len) - 1).map_err(|_| PeriodError::InvalidPeriod {
            text: format!("{len} years from {start}"),
            reason: "last year out of range".to_string(),
        })?;
        Self::new(start, end)
    }

    /// First year of the range.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last year of the range (inclusive).
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years in the range.
    pub fn len(&self) -> u32 {
        u32::try_from(i64::from(self.end) - i64::from(self.start) + 1).unwrap_or(u32::MAX)
    }

    /// Always `false`: a valid range holds at least one year.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `year` falls within the range.
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Returns `true` if `other` lies entirely within this range.
    pub fn covers(&self, other: &YearRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Iterates over the years of the range.
    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start..=self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn leading_year(text: &str, side: &str) -> Result<i32, PeriodError> {
    let digits = side.trim();
    if digits.len() < 4 || !digits.as_bytes()[..4].iter().all(u8::is_ascii_digit) {
        return Err(PeriodError::InvalidPeriod {
            text: text.to_string(),
            reason: format!("'{digits}' does not start with a four-digit year"),
        });
    }
    digits[..4].parse().map_err(|_| PeriodError::InvalidPeriod {
        text: text.to_string(),
        reason: format!("'{digits}' does not start with a four-digit year"),
    })
}

impl FromStr for YearRange {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, last) = s.split_once('-').ok_or_else(|| PeriodError::InvalidPeriod {
            text: s.to_string(),
            reason: "expected 'YYYY-YYYY'".to_string(),
        })?;
        Self::new(leading_year(s, first)?, leading_year(s, last)?)
    }
}

impl TryFrom<String> for YearRange {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearRange> for String {
    fn from(value: YearRange) -> Self {
        value.to_string()
    }
}
