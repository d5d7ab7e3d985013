use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone.trim())
        .map_err(|_| CoreError::InvalidTimezone(format!("Invalid timezone: {}", timezone)))
}

/// Local calendar date of an instant in the given zone
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// First instant of a local calendar date.
///
/// When midnight is skipped by a DST transition the day starts one hour
/// later; if even that does not exist the naive time is read as UTC.
pub fn start_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight).earliest() {
        Some(local_dt) => local_dt.with_timezone(&Utc),
        None => {
            let shifted = midnight + Duration::hours(1);
            match tz.from_local_datetime(&shifted).earliest() {
                Some(local_dt) => local_dt.with_timezone(&Utc),
                None => Utc.from_utc_datetime(&midnight),
            }
        }
    }
}

/// Format datetime with timezone-aware display
pub fn format_with_timezone(datetime: DateTime<Utc>, tz: &Tz, format: &str) -> String {
    datetime.with_timezone(tz).format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("America/New_York").is_ok());
        assert!(matches!(
            parse_timezone("Invalid/Timezone"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_start_of_day_uses_local_midnight() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        // CET is UTC+1 in January
        assert_eq!(
            start_of_day(date, &tz),
            Utc.with_ymd_and_hms(2025, 1, 14, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_start_of_day_when_midnight_is_skipped() {
        // Chile springs forward at 00:00 local, so 2024-09-08 begins at 01:00 (UTC-3).
        let tz: Tz = "America/Santiago".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        assert_eq!(
            start_of_day(date, &tz),
            Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap();
        assert_eq!(local_date(instant, &tz), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }
}
