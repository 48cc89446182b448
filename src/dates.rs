//! Payment date handling.
//!
//! Start dates arrive as `dd.mm.yyyy` text (or already as `yyyy-mm-dd`);
//! payment dates are rendered back as `dd.mm.yyyy`. A schedule without a start
//! date is indexed by month number only.

use std::borrow::Cow;
use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::ScheduleError;

const ISO_FORMAT: &str = "%Y-%m-%d";
const DISPLAY_FORMAT: &str = "%d.%m.%Y";

/// The date column of a schedule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDate {
    Calendar(NaiveDate),
    /// Month offset, used when the request carries no start date.
    MonthIndex(u32),
    /// Placeholder for rows that have no date, such as the totals row.
    Unscheduled,
}

impl fmt::Display for PaymentDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentDate::Calendar(date) => write!(f, "{}", date.format(DISPLAY_FORMAT)),
            PaymentDate::MonthIndex(index) => write!(f, "{index}"),
            PaymentDate::Unscheduled => f.write_str("-"),
        }
    }
}

impl Serialize for PaymentDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaymentDate::MonthIndex(index) => serializer.serialize_u32(*index),
            other => serializer.collect_str(other),
        }
    }
}

/// Rewrites `d.m.y` (or `d/m/y`) text as `yyyy-mm-dd`.
///
/// Text without a day/month/year separator is returned unchanged.
pub fn normalize(text: &str) -> Cow<'_, str> {
    let Some(separator) = ['.', '/'].into_iter().find(|sep| text.contains(*sep)) else {
        return Cow::Borrowed(text);
    };

    let parts: Vec<&str> = text.split(separator).map(str::trim).collect();
    match parts.as_slice() {
        [day, month, year] => Cow::Owned(format!("{year}-{month:0>2}-{day:0>2}")),
        _ => Cow::Borrowed(text),
    }
}

/// Parses the optional start date of a schedule.
///
/// Absent or blank text means "no start date". Anything else must be a valid
/// calendar date once normalized.
pub fn parse_start_date(text: Option<&str>) -> Result<Option<NaiveDate>, ScheduleError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(&normalize(text), ISO_FORMAT)
        .map(Some)
        .map_err(|e| ScheduleError::InvalidDate {
            value: text.to_string(),
            reason: e.to_string(),
        })
}

/// Date of the payment `offset` months after `start`.
///
/// Month arithmetic follows the calendar: December rolls into January of the
/// next year, and a day missing from the target month overflows into the
/// following one (31.01 plus one month is 02.03 in a leap year).
pub fn project_payment_date(start: Option<NaiveDate>, offset: u32) -> PaymentDate {
    match start {
        None => PaymentDate::MonthIndex(offset),
        Some(date) => date
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(offset)))
            .and_then(|month| month.checked_add_days(Days::new(u64::from(date.day0()))))
            .map(PaymentDate::Calendar)
            .unwrap_or(PaymentDate::MonthIndex(offset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[rstest]
    #[case("5.3.2024", "2024-03-05")]
    #[case("15.11.2024", "2024-11-15")]
    #[case("01/02/2025", "2025-02-01")]
    #[case("2024-03-05", "2024-03-05")]
    #[case("", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_parse_start_date() {
        assert_eq!(parse_start_date(Some("5.3.2024")).unwrap(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_start_date(Some("2024-03-05")).unwrap(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_start_date(None).unwrap(), None);
        assert_eq!(parse_start_date(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_parse_start_date_rejects_garbage() {
        let err = parse_start_date(Some("31.02.2024")).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::InvalidDate { ref value, .. } if value == "31.02.2024"
        ));
        assert!(parse_start_date(Some("next tuesday")).is_err());
    }

    #[test]
    fn test_projection_without_start_date_is_month_index() {
        assert_eq!(project_payment_date(None, 7), PaymentDate::MonthIndex(7));
        assert_eq!(PaymentDate::MonthIndex(7).to_string(), "7");
    }

    #[test]
    fn test_projection_rolls_over_year() {
        let date = project_payment_date(Some(ymd(2024, 11, 15)), 3);
        assert_eq!(date, PaymentDate::Calendar(ymd(2025, 2, 15)));
        assert_eq!(date.to_string(), "15.02.2025");
    }

    #[rstest]
    #[case(ymd(2024, 1, 31), 1, ymd(2024, 3, 2))]
    #[case(ymd(2025, 1, 31), 1, ymd(2025, 3, 3))]
    #[case(ymd(2024, 1, 30), 1, ymd(2024, 3, 1))]
    #[case(ymd(2024, 1, 29), 1, ymd(2024, 2, 29))]
    #[case(ymd(2024, 8, 31), 1, ymd(2024, 10, 1))]
    #[case(ymd(2024, 12, 31), 2, ymd(2025, 3, 3))]
    #[case(ymd(2024, 1, 31), 2, ymd(2024, 3, 31))]
    fn test_projection_overflows_missing_days(
        #[case] start: NaiveDate,
        #[case] offset: u32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(project_payment_date(Some(start), offset), PaymentDate::Calendar(expected));
    }

    #[test]
    fn test_payment_date_serialization() {
        let calendar = serde_json::to_value(PaymentDate::Calendar(ymd(2024, 3, 5))).unwrap();
        assert_eq!(calendar, serde_json::json!("05.03.2024"));
        let index = serde_json::to_value(PaymentDate::MonthIndex(4)).unwrap();
        assert_eq!(index, serde_json::json!(4));
        let none = serde_json::to_value(PaymentDate::Unscheduled).unwrap();
        assert_eq!(none, serde_json::json!("-"));
    }
}
