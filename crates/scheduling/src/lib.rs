//! `tutorflow-scheduling` — session calendar logic.
//!
//! Deterministic, pure logic. No IO, no wall-clock. All arithmetic is
//! date-only (`NaiveDate`): a timezone-aware instant would shift by a day
//! under DST or UTC-offset conversion when reformatted, date tuples cannot.

pub mod schedule;

pub use schedule::{
    REST_DAY, StartDateRange, TimeSlots, WEEKEND_DAY, generate_session_dates, resolve_time_slot,
};
