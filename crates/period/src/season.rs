//! Season tokens and month membership.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// A climatological season, or the whole year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Season {
    /// All twelve months.
    Ann,
    /// December, January, February.
    Djf,
    /// March, April, May.
    Mam,
    /// June, July, August.
    Jja,
    /// September, October, November.
    Son,
}

impl Season {
    /// All seasons, whole year first.
    pub const ALL: [Season; 5] = [Season::Ann, Season::Djf, Season::Mam, Season::Jja, Season::Son];

    /// Months (1..=12) belonging to the season, in calendar order of the season.
    pub fn months(&self) -> &'static [u8] {
        match self {
            Season::Ann => &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
            Season::Djf => &[12, 1, 2],
            Season::Mam => &[3, 4, 5],
            Season::Jja => &[6, 7, 8],
            Season::Son => &[9, 10, 11],
        }
    }

    /// Returns `true` for the whole-year token.
    pub fn is_annual(&self) -> bool {
        matches!(self, Season::Ann)
    }

    /// Returns `true` if `month` belongs to the season.
    pub fn contains_month(&self, month: u8) -> bool {
        self.months().contains(&month)
    }

    /// Year a month is attributed to when building one value per season
    /// and year. December counts towards the following year's DJF.
    pub fn season_year(&self, year: i32, month: u8) -> i32 {
        if matches!(self, Season::Djf) && month == 12 {
            year + 1
        } else {
            year
        }
    }

    /// Upper-case token, e.g. `"DJF"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Ann => "ANN",
            Season::Djf => "DJF",
            Season::Mam => "MAM",
            Season::Jja => "JJA",
            Season::Son => "SON",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = PeriodError;

    /// Parses a season token. `ann`, `ANN` and `anm` all denote the whole year.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANN" | "ANM" => Ok(Season::Ann),
            "DJF" => Ok(Season::Djf),
            "MAM" => Ok(Season::Mam),
            "JJA" => Ok(Season::Jja),
            "SON" => Ok(Season::Son),
            _ => Err(PeriodError::UnknownSeason {
                token: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Season {
    type Error = PeriodError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(value: Season) -> Self {
        value.as_str().to_string()
    }
}
