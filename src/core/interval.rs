use std::fmt::{Debug, Formatter};

use chrono::{NaiveDateTime, TimeDelta};

#[derive(Copy, Clone, Eq, PartialEq)]
#[must_use]
pub struct Interval {
    /// Inclusive.
    pub start: NaiveDateTime,

    /// Exclusive.
    pub end: NaiveDateTime,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// `None` if the end does not fit into [`NaiveDateTime`].
    #[must_use]
    pub fn with_duration(start: NaiveDateTime, duration: TimeDelta) -> Option<Self> {
        Some(Self::new(start, start.checked_add_signed(duration)?))
    }
}
