use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::{
    helpers::{format_hundredths, parse_hundredths},
    MoneyConversionError,
};

/// A dividend rate expressed as a percentage with two decimal places of precision.
///
/// The inner value is in hundredths of a percent, so `5%` is `DividendRate(500)` and `2.75%` is `DividendRate(275)`.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct DividendRate(i64);

impl DividendRate {
    /// The denominator that converts the inner value to a plain fraction (hundredths of a percent).
    pub const SCALE: i64 = 10_000;

    pub fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    pub fn from_percent(percent: i64) -> Self {
        Self(percent * 100)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl FromStr for DividendRate {
    type Err = MoneyConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hundredths(s.trim().trim_end_matches('%')).map(Self).ok_or_else(|| MoneyConversionError::new(s))
    }
}

impl Display for DividendRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", format_hundredths(self.0))
    }
}
