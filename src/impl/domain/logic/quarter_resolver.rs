use chrono::{Datelike as _, NaiveDate};
use fractic_server_error::ServerError;

use crate::{
    entities::{Quarter, QuarterRange, QuarterSelector},
    errors::{InvalidCalculationParameter, InvalidMonthCode},
};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Maps calendar dates to fiscal quarters. Pure; never reads the clock.
pub struct QuarterResolver;

impl QuarterResolver {
    pub fn current_quarter(date: NaiveDate) -> Result<QuarterRange, ServerError> {
        Self::quarter_range(Self::quarter_for_month(date.month())?, date.year())
    }

    pub fn resolve(selector: &QuarterSelector) -> Result<QuarterRange, ServerError> {
        Self::quarter_range(selector.quarter, selector.year)
    }

    /// Fixed calendar boundaries of a quarter (Q1 = Jan 1 to Mar 31, ...,
    /// Q4 = Oct 1 to Dec 31).
    pub fn quarter_range(quarter: Quarter, year: i32) -> Result<QuarterRange, ServerError> {
        let (first_month, last_month) = quarter.months();
        let last_day = match quarter {
            Quarter::Q1 | Quarter::Q4 => 31,
            Quarter::Q2 | Quarter::Q3 => 30,
        };
        let from = NaiveDate::from_ymd_opt(year, first_month, 1);
        let to = NaiveDate::from_ymd_opt(year, last_month, last_day);
        match (from, to) {
            (Some(from), Some(to)) => Ok(QuarterRange {
                quarter,
                year,
                from,
                to,
            }),
            _ => Err(InvalidCalculationParameter::new(&format!(
                "year {year} is out of range"
            ))),
        }
    }

    /// Month 1-3 is Q1, 4-6 Q2, 7-9 Q3 and 10-12 Q4.
    pub fn quarter_for_month(month: u32) -> Result<Quarter, ServerError> {
        match month {
            1..=12 => Ok(Quarter::ALL[((month - 1) / 3) as usize]),
            _ => Err(InvalidMonthCode::new(&month.to_string())),
        }
    }

    /// Accepts "1".."12", "01".."12" or an English three-letter
    /// abbreviation ("Jan".."Dec", any case).
    pub fn month_from_code(code: &str) -> Result<u32, ServerError> {
        let trimmed = code.trim();
        if !trimmed.is_empty() && trimmed.len() <= 2 && trimmed.bytes().all(|b| b.is_ascii_digit())
        {
            return match trimmed.parse::<u32>() {
                Ok(m) if (1..=12).contains(&m) => Ok(m),
                _ => Err(InvalidMonthCode::new(code)),
            };
        }
        let lower = trimmed.to_ascii_lowercase();
        MONTH_ABBREVIATIONS
            .iter()
            .position(|m| *m == lower)
            .map(|i| i as u32 + 1)
            .ok_or_else(|| InvalidMonthCode::new(code))
    }

    pub fn quarter_for_month_code(code: &str, year: i32) -> Result<QuarterRange, ServerError> {
        Self::quarter_range(Self::quarter_for_month(Self::month_from_code(code)?)?, year)
    }
}
