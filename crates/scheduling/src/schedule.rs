use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Weekly rest day. Sessions are never scheduled on it.
pub const REST_DAY: Weekday = Weekday::Sun;

/// Day the weekend-specific time slot applies to.
pub const WEEKEND_DAY: Weekday = Weekday::Sat;

/// Calendar dates for a recurring session package.
///
/// Walks forward one calendar day at a time from `start` inclusive, keeps
/// every date whose weekday is not `excluded_weekday`, and stops once
/// `session_count` dates are collected.
///
/// The caller is responsible for rejecting a `start` that falls on the
/// excluded weekday; this function would simply begin on the next valid day.
pub fn generate_session_dates(
    start: NaiveDate,
    session_count: usize,
    excluded_weekday: Weekday,
) -> Vec<NaiveDate> {
    start
        .iter_days()
        .filter(|date| date.weekday() != excluded_weekday)
        .take(session_count)
        .collect()
}

/// Which of the two time-slot preferences applies to `date`.
pub fn resolve_time_slot(
    date: NaiveDate,
    weekday_time: NaiveTime,
    weekend_time: NaiveTime,
    weekend_day: Weekday,
) -> NaiveTime {
    if date.weekday() == weekend_day {
        weekend_time
    } else {
        weekday_time
    }
}

/// Time-slot preferences for a package.
///
/// A trial has exactly one slot; a multi-session pack has a consistent
/// weekday slot plus a weekend-specific one, applied per-date by day-of-week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeSlots {
    Single { time: NaiveTime },
    Split { weekday: NaiveTime, weekend: NaiveTime },
}

impl TimeSlots {
    /// Session time for one concrete date.
    pub fn time_for(&self, date: NaiveDate, weekend_day: Weekday) -> NaiveTime {
        match *self {
            TimeSlots::Single { time } => time,
            TimeSlots::Split { weekday, weekend } => {
                resolve_time_slot(date, weekday, weekend, weekend_day)
            }
        }
    }
}

/// Selectable window for a package start date.
///
/// Only dates strictly after "tomorrow" and at most one calendar month
/// beyond that are selectable. Enforced by the caller at the input boundary;
/// the scheduler itself never rejects a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartDateRange {
    /// First selectable date (the day after tomorrow).
    pub earliest: NaiveDate,
    /// Last selectable date (one calendar month after tomorrow).
    pub latest: NaiveDate,
}

impl StartDateRange {
    pub fn from_today(today: NaiveDate) -> Self {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX);
        Self {
            earliest: tomorrow.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX),
            latest: tomorrow
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}
