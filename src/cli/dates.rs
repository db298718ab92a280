use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::utils::time::record_name_to_date;

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

pub const DATE_HELP: &str =
    "Examples are \"today\", \"yesterday\", \"2025-03-15\", \"15/03/2025\", \"last friday\"";

/// Parses a day given on the command line. `YYYY-MM-DD` is always accepted, anything else goes
/// through english date parsing relative to `now`.
pub fn parse_day(input: &str, style: DateStyle, now: DateTime<Local>) -> Result<NaiveDate> {
    if let Ok(date) = record_name_to_date(input.trim()) {
        return Ok(date);
    }
    match parse_date_string(input, now, style.into()) {
        Ok(v) => Ok(v.with_timezone(&Local).date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {input:?}: {e}"),
            )
            .into()),
    }
}

/// Parses an optional day, falling back to today.
pub fn parse_day_or_today(input: Option<&str>, style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    input.map_or(Ok(now.date_naive()), |input| parse_day(input, style, now))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, NaiveDate, TimeZone};

    use super::{parse_day, DateStyle};

    #[test]
    fn test_parse_day() {
        let now = Local.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(
            parse_day("2025-01-02", DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        assert_eq!(
            parse_day("yesterday", DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
        );
        assert_eq!(
            parse_day("05/04/2025", DateStyle::Uk, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 5).unwrap()
        );
        assert_eq!(
            parse_day("05/04/2025", DateStyle::Us, now).unwrap(),
            NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()
        );
        assert!(parse_day("the day after never", DateStyle::Uk, now).is_err());
    }
}
