use std::fmt;

use chrono::NaiveDate;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// First and last calendar month of the quarter (inclusive).
    pub fn months(&self) -> (u32, u32) {
        match self {
            Quarter::Q1 => (1, 3),
            Quarter::Q2 => (4, 6),
            Quarter::Q3 => (7, 9),
            Quarter::Q4 => (10, 12),
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        };
        f.write_str(s)
    }
}

/// A fiscal quarter of a calendar year with its inclusive date boundaries.
///
/// Only constructed through `QuarterResolver`, so the boundaries always
/// match the quarter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuarterRange {
    pub(crate) quarter: Quarter,
    pub(crate) year: i32,
    pub(crate) from: NaiveDate,
    pub(crate) to: NaiveDate,
}

impl QuarterRange {
    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// ISO formatted first day (ex. "2024-01-01").
    pub fn formatted_from(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    /// ISO formatted last day (ex. "2024-03-31").
    pub fn formatted_to(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }

    pub fn selector(&self) -> QuarterSelector {
        QuarterSelector {
            quarter: self.quarter,
            year: self.year,
        }
    }
}

impl fmt::Display for QuarterRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} ({} to {})",
            self.quarter,
            self.year,
            self.formatted_from(),
            self.formatted_to()
        )
    }
}

/// Explicit quarter/year override for recomputation and reporting requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterSelector {
    pub quarter: Quarter,
    pub year: i32,
}

impl fmt::Display for QuarterSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.quarter, self.year)
    }
}
