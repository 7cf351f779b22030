//! Money value object in minor currency units.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A currency amount in minor units (e.g. cents).
///
/// All price arithmetic happens on whole minor units so rounding stays
/// explicit: fractional results (percentage discounts) are rounded half-up
/// to a minor unit at the point they are produced, and subtraction is exact.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// From minor units (e.g. cents).
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// From whole major units (`from_major(120)` is 120.00).
    pub const fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtraction that floors at zero. Observable amounts never go negative.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// A percentage of this amount, rounded half-up to a whole minor unit.
    ///
    /// `percent` is expected in `0..=100`; `f64::round` is half-up for the
    /// non-negative amounts this domain produces.
    pub fn percentage(self, percent: f64) -> Money {
        Money((self.0 as f64 * percent / 100.0).round() as i64)
    }

    /// This amount multiplied by a whole count (e.g. per-session price).
    pub fn times(self, count: u32) -> Money {
        Money(self.0 * i64::from(count))
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl core::fmt::Display for Money {
    /// Formats as major units with exactly two decimals (`"103.00"`).
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl ValueObject for Money {}
