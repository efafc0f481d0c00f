use std::{str::FromStr, sync::LazyLock};

use fractic_server_error::ServerError;
use regex::Regex;

use crate::{
    entities::{Quarter, QuarterSelector},
    errors::InvalidQuarterSelector,
};

static QUARTER_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^q([1-4])[-/ ](\d{4})$").expect("hardcoded regex should be valid")
});
static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{4})[-/ ]q([1-4])$").expect("hardcoded regex should be valid")
});

/// Parses "Q1-2024", "2024-Q1", "q3/2025", ...
impl FromStr for QuarterSelector {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (quarter, year) = if let Some(c) = QUARTER_FIRST.captures(trimmed) {
            (c[1].to_string(), c[2].to_string())
        } else if let Some(c) = YEAR_FIRST.captures(trimmed) {
            (c[2].to_string(), c[1].to_string())
        } else {
            return Err(InvalidQuarterSelector::new(s));
        };
        let quarter = match quarter.as_str() {
            "1" => Quarter::Q1,
            "2" => Quarter::Q2,
            "3" => Quarter::Q3,
            _ => Quarter::Q4,
        };
        let year = year
            .parse::<i32>()
            .map_err(|e| InvalidQuarterSelector::with_debug(s, &e))?;
        Ok(QuarterSelector { quarter, year })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_orders() {
        let expected = QuarterSelector {
            quarter: Quarter::Q3,
            year: 2024,
        };
        assert_eq!("Q3-2024".parse::<QuarterSelector>().unwrap(), expected);
        assert_eq!("2024-q3".parse::<QuarterSelector>().unwrap(), expected);
        assert_eq!(" q3/2024 ".parse::<QuarterSelector>().unwrap(), expected);
    }

    #[test]
    fn rejects_malformed_selectors() {
        for bad in ["Q5-2024", "2024", "Q1-24", "Q1-2024-extra", ""] {
            assert!(bad.parse::<QuarterSelector>().is_err(), "{bad:?}");
        }
    }
}
