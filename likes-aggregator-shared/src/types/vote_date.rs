use std::fmt;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::KeyError;

lazy_static! {
    static ref DATE_REGEXP: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// A calendar day in strict `YYYY-MM-DD` form, used to scope daily like counters.
///
/// The textual form is kept as received so that rendered document paths match the
/// paths written by clients byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoteDate {
    raw: String,
}

impl VoteDate {
    /// Validates a `YYYY-MM-DD` string.
    ///
    /// Both the shape and the calendar value are checked, so `2025/01/01` and
    /// `2025-13-01` are rejected alike.
    pub fn parse(raw: &str) -> Result<Self, KeyError> {
        if !DATE_REGEXP.is_match(raw) {
            return Err(KeyError::InvalidDate(raw.to_string()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| KeyError::InvalidDate(raw.to_string()))?;
        Ok(Self { raw: raw.to_string() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for VoteDate {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VoteDate> for String {
    fn from(date: VoteDate) -> Self {
        date.raw
    }
}

impl fmt::Display for VoteDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_date() {
        let date = VoteDate::parse("2025-02-28").unwrap();
        assert_eq!(date.as_str(), "2025-02-28");
        assert_eq!(date.to_string(), "2025-02-28");
    }

    #[test]
    fn test_rejects_wrong_separator() {
        assert!(matches!(
            VoteDate::parse("2025/01/01"),
            Err(KeyError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_rejects_impossible_month() {
        assert!(matches!(
            VoteDate::parse("2025-13-01"),
            Err(KeyError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_rejects_impossible_day() {
        assert!(VoteDate::parse("2025-02-30").is_err());
        assert!(VoteDate::parse("2024-02-29").is_ok());
    }

    #[test]
    fn test_rejects_unpadded_and_padded_forms() {
        assert!(VoteDate::parse("2025-1-01").is_err());
        assert!(VoteDate::parse(" 2025-01-01").is_err());
        assert!(VoteDate::parse("2025-01-01T00:00").is_err());
        assert!(VoteDate::parse("").is_err());
    }
}
