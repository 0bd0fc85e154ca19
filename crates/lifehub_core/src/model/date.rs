//! Calendar date parsing for habit log keys.

use crate::model::habit::ValidationError;
use chrono::NaiveDate;

/// Wire format for every calendar date in habit records.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses one `YYYY-MM-DD` calendar date.
///
/// Only the format is checked; dates far in the past or future are accepted.
///
/// # Errors
/// - Returns `ValidationError::MalformedDate` when the input is not a valid
///   calendar date in wire format.
pub fn parse_calendar_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::MalformedDate(trimmed.to_string()))
}

/// Formats a calendar date using the wire format.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{format_calendar_date, parse_calendar_date};
    use crate::model::habit::ValidationError;
    use chrono::NaiveDate;

    #[test]
    fn parses_wire_dates_with_surrounding_whitespace() {
        let date = parse_calendar_date(" 2024-01-03 ").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(format_calendar_date(date), "2024-01-03");
    }

    #[test]
    fn accepts_far_future_dates() {
        assert!(parse_calendar_date("2999-12-31").is_ok());
    }

    #[test]
    fn rejects_impossible_and_malformed_dates() {
        for raw in ["2024-02-30", "01/03/2024", "yesterday", ""] {
            let err = parse_calendar_date(raw).unwrap_err();
            assert!(matches!(err, ValidationError::MalformedDate(_)), "{raw}");
        }
    }
}
