use chrono::{DateTime, NaiveDate, Utc};
use chrono_english::{parse_date_string, Dialect};
use tend_core::models::Unit;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("Invalid cadence '{0}': expected something like '3 days', '2w' or 'month'")]
    Cadence(String),
    #[error("Failed to parse date '{0}': {1}")]
    Date(String, String),
}

/// Parses a cadence such as `3 days`, `2w`, `1 month` or `week`.
///
/// The number defaults to 1. Its sign is not checked here; the scheduler
/// rejects non-positive intervals.
pub fn parse_cadence(input: &str) -> Result<(i64, Unit), InputError> {
    let trimmed = input.trim();
    let invalid = || InputError::Cadence(input.to_string());

    let split = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(trimmed.len(), |(i, _)| i);
    let (number, unit) = trimmed.split_at(split);

    let interval = if number.is_empty() {
        1
    } else {
        number.parse::<i64>().map_err(|_| invalid())?
    };

    let unit = match unit.trim().to_lowercase().as_str() {
        "d" => Unit::Day,
        "w" => Unit::Week,
        "m" => Unit::Month,
        other => other.parse::<Unit>().map_err(|_| invalid())?,
    };

    Ok((interval, unit))
}

/// Parses a free-form past moment such as "yesterday" or "2024-05-01".
pub fn parse_last_done(input: &str) -> Result<DateTime<Utc>, InputError> {
    parse_date_string(input, Utc::now(), Dialect::Us)
        .map_err(|e| InputError::Date(input.to_string(), e.to_string()))
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(input: &str) -> Result<NaiveDate, InputError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| InputError::Date(input.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case("3 days", 3, Unit::Day)]
    #[case("3d", 3, Unit::Day)]
    #[case("2 weeks", 2, Unit::Week)]
    #[case("2W", 2, Unit::Week)]
    #[case("month", 1, Unit::Month)]
    #[case(" 6 months ", 6, Unit::Month)]
    #[case("-1 day", -1, Unit::Day)]
    fn test_parse_cadence(#[case] input: &str, #[case] interval: i64, #[case] unit: Unit) {
        assert_eq!(parse_cadence(input), Ok((interval, unit)));
    }

    #[rstest]
    #[case("")]
    #[case("3")]
    #[case("3 fortnights")]
    #[case("x days")]
    #[case("1-2 days")]
    fn test_parse_cadence_rejects(#[case] input: &str) {
        assert!(matches!(parse_cadence(input), Err(InputError::Cadence(_))));
    }

    #[test]
    fn test_parse_last_done() {
        let yesterday = parse_last_done("yesterday").unwrap();
        assert!(yesterday < Utc::now());
        assert!(yesterday > Utc::now() - Duration::days(3));
        assert!(parse_last_done("not a date at all").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-03-12"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 12).unwrap())
        );
        assert!(matches!(parse_date("12/03/2024"), Err(InputError::Date(_, _))));
    }
}
