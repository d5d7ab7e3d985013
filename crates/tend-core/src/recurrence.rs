use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::Unit;

/// Largest accepted interval, in units. Keeps every due date inside chrono's range.
pub const MAX_INTERVAL: i64 = 10_000;

/// A month is a fixed four weeks, not a calendar month.
pub const WEEKS_PER_MONTH: i64 = 4;

/// Validates a rule interval before it is persisted.
pub fn validate_interval(interval: i64) -> Result<(), CoreError> {
    if interval < 1 {
        return Err(CoreError::Validation(
            "interval must be positive".to_string(),
        ));
    }
    if interval > MAX_INTERVAL {
        return Err(CoreError::Validation(format!(
            "interval must not exceed {}",
            MAX_INTERVAL
        )));
    }
    Ok(())
}

/// Spacing between successive due dates of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cadence {
    interval: i64,
    unit: Unit,
}

impl Cadence {
    /// Creates a validated cadence.
    pub fn new(interval: i64, unit: Unit) -> Result<Self, CoreError> {
        validate_interval(interval)?;
        Ok(Self { interval, unit })
    }

    /// Values read back from the store were validated on the way in.
    pub(crate) fn from_stored(interval: i64, unit: Unit) -> Self {
        Self { interval, unit }
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Length of one period, or `None` if it does not fit in a `Duration`.
    pub fn span(&self) -> Option<Duration> {
        match self.unit {
            Unit::Day => Duration::try_days(self.interval),
            Unit::Week => Duration::try_weeks(self.interval),
            Unit::Month => self
                .interval
                .checked_mul(WEEKS_PER_MONTH)
                .and_then(Duration::try_weeks),
        }
    }

    /// See [`next_due_date`].
    pub fn next_due(&self, reference: Option<DateTime<Utc>>) -> DateTime<Utc> {
        next_due_date(reference, self.interval, self.unit)
    }

    /// See [`next_due_date_at`].
    pub fn next_due_at(&self, reference: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
        next_due_date_at(reference, self.interval, self.unit, now)
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}(s)", self.interval, self.unit)
    }
}

/// Computes when the next occurrence of a rule is due.
///
/// With no reference (the rule has never been completed) the occurrence is due
/// immediately, so the current wall-clock time is returned. Otherwise the
/// reference is advanced by `interval` days, weeks or 28-day months.
pub fn next_due_date(reference: Option<DateTime<Utc>>, interval: i64, unit: Unit) -> DateTime<Utc> {
    next_due_date_at(reference, interval, unit, Utc::now())
}

/// Same as [`next_due_date`] with an explicit "now" for the no-reference case.
///
/// The sum saturates at `DateTime::<Utc>::MAX_UTC` rather than overflowing.
pub fn next_due_date_at(
    reference: Option<DateTime<Utc>>,
    interval: i64,
    unit: Unit,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let Some(reference) = reference else {
        return now;
    };

    Cadence { interval, unit }
        .span()
        .and_then(|span| reference.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use rstest::rstest;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 8, 30, 0).unwrap()
    }

    #[rstest]
    #[case(5, Unit::Day, 5)]
    #[case(1, Unit::Day, 1)]
    #[case(3, Unit::Week, 21)]
    #[case(1, Unit::Week, 7)]
    #[case(2, Unit::Month, 56)]
    #[case(1, Unit::Month, 28)]
    fn test_next_due_date_advances_reference(#[case] interval: i64, #[case] unit: Unit, #[case] days: i64) {
        let next = next_due_date(Some(reference()), interval, unit);
        assert_eq!(next, reference() + Duration::days(days));
    }

    #[test]
    fn test_month_is_not_a_calendar_month() {
        // 28 days after January 31st, regardless of how long January is.
        let next = next_due_date(Some(reference()), 1, Unit::Month);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 2, 28, 8, 30, 0).unwrap());

        let leap = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(
            next_due_date(Some(leap), 1, Unit::Month),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[rstest]
    #[case(Unit::Day)]
    #[case(Unit::Week)]
    #[case(Unit::Month)]
    fn test_next_due_date_without_reference_is_now(#[case] unit: Unit) {
        let before = Utc::now();
        let next = next_due_date(None, 3, unit);
        let after = Utc::now();
        assert!(next >= before && next <= after);
    }

    #[test]
    fn test_next_due_date_at_uses_supplied_now() {
        let now = reference();
        assert_eq!(next_due_date_at(None, 2, Unit::Week, now), now);
    }

    #[test]
    fn test_next_due_date_saturates_instead_of_overflowing() {
        let far = DateTime::<Utc>::MAX_UTC - Duration::days(1);
        assert_eq!(next_due_date(Some(far), 2, Unit::Month), DateTime::<Utc>::MAX_UTC);
        assert_eq!(next_due_date(Some(reference()), i64::MAX, Unit::Month), DateTime::<Utc>::MAX_UTC);
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(-365)]
    fn test_non_positive_interval_is_rejected(#[case] interval: i64) {
        let err = Cadence::new(interval, Unit::Day).unwrap_err();
        assert!(matches!(err, CoreError::Validation(msg) if msg == "interval must be positive"));
    }

    #[test]
    fn test_interval_upper_bound() {
        assert!(Cadence::new(MAX_INTERVAL, Unit::Month).is_ok());
        assert!(matches!(
            Cadence::new(MAX_INTERVAL + 1, Unit::Day),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_cadence_display() {
        assert_eq!(Cadence::new(2, Unit::Week).unwrap().to_string(), "2 week(s)");
        assert_eq!(Cadence::new(1, Unit::Day).unwrap().to_string(), "1 day(s)");
    }

    proptest! {
        #[test]
        fn prop_month_is_four_weeks(interval in 1i64..=MAX_INTERVAL, offset_secs in 0i64..4_000_000_000) {
            let t = Utc.timestamp_opt(offset_secs, 0).unwrap();
            prop_assert_eq!(
                next_due_date(Some(t), interval, Unit::Month),
                next_due_date(Some(t), 4 * interval, Unit::Week)
            );
            prop_assert_eq!(
                next_due_date(Some(t), interval, Unit::Week),
                next_due_date(Some(t), 7 * interval, Unit::Day)
            );
        }

        #[test]
        fn prop_next_due_is_strictly_later(interval in 1i64..=MAX_INTERVAL, unit_idx in 0usize..3) {
            let unit = [Unit::Day, Unit::Week, Unit::Month][unit_idx];
            let cadence = Cadence::new(interval, unit).unwrap();
            let t = reference();
            prop_assert!(cadence.next_due(Some(t)) > t);
            prop_assert_eq!(cadence.next_due(Some(t)) - t, cadence.span().unwrap());
        }
    }
}
