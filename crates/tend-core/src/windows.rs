//! Due-window classification.
//!
//! Everything here is pure: callers fetch open occurrences, then ask which
//! local day they fall on relative to a reference "now".

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::{CalendarDay, DueWindows, Occurrence, ScheduledTask};
use crate::timezone::{local_date, start_of_day};

/// Longest calendar or upcoming horizon accepted, in days (about ten years).
pub const MAX_CALENDAR_DAYS: i64 = 3_660;

/// Validates a day count used for a calendar range or an upcoming horizon.
pub fn validate_days(days: i64) -> Result<(), CoreError> {
    if days < 0 {
        return Err(CoreError::Validation("days must not be negative".to_string()));
    }
    if days > MAX_CALENDAR_DAYS {
        return Err(CoreError::Validation(format!(
            "days must not exceed {}",
            MAX_CALENDAR_DAYS
        )));
    }
    Ok(())
}

/// Anything with a due date can be classified.
pub trait Scheduled {
    fn due_date(&self) -> DateTime<Utc>;
}

impl Scheduled for Occurrence {
    fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }
}

impl Scheduled for ScheduledTask {
    fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }
}

/// The UTC range covered by one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    /// Local midnight
    pub start: DateTime<Utc>,
    /// Local midnight of the following day (exclusive)
    pub next_start: DateTime<Utc>,
}

impl DayBounds {
    pub fn for_date(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
        Self {
            start: start_of_day(date, tz),
            next_start: start_of_day(next, tz),
        }
    }

    pub fn containing(instant: DateTime<Utc>, tz: &Tz) -> Self {
        Self::for_date(local_date(instant, tz), tz)
    }

    /// Last representable microsecond of the day (local 23:59:59.999999).
    pub fn end(&self) -> DateTime<Utc> {
        self.next_start - Duration::microseconds(1)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.next_start
    }
}

/// Splits open occurrences into overdue, due today and upcoming.
///
/// "Today" is the local day containing `now` in `tz`. With a horizon, upcoming
/// occurrences due after the end of day `today + horizon_days` are left out.
/// Each bucket is sorted by due date.
pub fn classify<T: Scheduled>(
    open: impl IntoIterator<Item = T>,
    now: DateTime<Utc>,
    tz: &Tz,
    horizon_days: Option<i64>,
) -> DueWindows<T> {
    let today = DayBounds::containing(now, tz);
    let horizon_end = horizon_days.map(|days| horizon_boundary(now, tz, days));

    let mut windows = DueWindows::default();
    for item in open {
        let due = item.due_date();
        if due < today.start {
            windows.overdue.push(item);
        } else if due < today.next_start {
            windows.due_today.push(item);
        } else if horizon_end.map_or(true, |end| due < end) {
            windows.upcoming.push(item);
        }
    }

    windows.overdue.sort_by_key(|item| item.due_date());
    windows.due_today.sort_by_key(|item| item.due_date());
    windows.upcoming.sort_by_key(|item| item.due_date());
    windows
}

/// Groups upcoming occurrences by local date for the `days` days after today.
///
/// Every date in the range gets an entry, empty or not. Items outside the range
/// are ignored. `days` is clamped to `0..=MAX_CALENDAR_DAYS`.
pub fn calendar<T: Scheduled>(
    upcoming: impl IntoIterator<Item = T>,
    now: DateTime<Utc>,
    tz: &Tz,
    days: i64,
) -> Vec<CalendarDay<T>> {
    let today = local_date(now, tz);
    let mut calendar: Vec<CalendarDay<T>> = (1..=days.clamp(0, MAX_CALENDAR_DAYS) as u64)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| CalendarDay { date, tasks: Vec::new() })
        .collect();

    let index: HashMap<NaiveDate, usize> = calendar
        .iter()
        .enumerate()
        .map(|(i, day)| (day.date, i))
        .collect();

    for item in upcoming {
        if let Some(&i) = index.get(&local_date(item.due_date(), tz)) {
            calendar[i].tasks.push(item);
        }
    }

    for day in &mut calendar {
        day.tasks.sort_by_key(|item| item.due_date());
    }
    calendar
}

fn horizon_boundary(now: DateTime<Utc>, tz: &Tz, days: i64) -> DateTime<Utc> {
    let last_day = local_date(now, tz)
        .checked_add_days(Days::new(days.max(0) as u64))
        .unwrap_or(NaiveDate::MAX);
    DayBounds::for_date(last_day, tz).next_start
}
