//! Inclusive calendar date windows and their clamping to what a
//! source actually holds.

use chrono::{Duration, NaiveDate};
use serde_derive::{Deserialize, Serialize};

use crate::source::min_date;

/// An inclusive `[start, end]` range of days. `start <= end`
/// holds for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawWindow")]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

/// Deserialized bounds, before `start <= end` is enforced.
#[derive(Deserialize)]
struct RawWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl From<RawWindow> for DateWindow {
    fn from(raw: RawWindow) -> Self {
        DateWindow::new(raw.start, raw.end)
    }
}

impl DateWindow {
    /// Window from raw input. An `end` before `start` is pulled
    /// up to `start` rather than rejected.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow {
            start,
            end: end.max(start),
        }
    }

    /// The `days`-long window beginning on `start`.
    pub fn starting_at(start: NaiveDate, days: Duration) -> Self {
        let last = start + (days - Duration::days(1)).max(Duration::zero());
        DateWindow::new(start, last)
    }

    /// The `days`-long window finishing on `end`.
    pub fn ending_at(end: NaiveDate, days: Duration) -> Self {
        let first = end - (days - Duration::days(1)).max(Duration::zero());
        DateWindow::new(first, end)
    }

    #[inline]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp into the range a source holds data for.
    pub fn clamp_to(self, avail: &Availability) -> Self {
        let lo = avail.earliest;
        let hi = avail.latest.max(lo);
        let start = self.start.max(lo).min(hi);
        let end = self.end.max(start).min(hi);
        DateWindow { start, end }
    }

    /// Length of the window in whole days, weeks and months.
    pub fn span(&self) -> WindowSpan {
        let days = (self.end - self.start).num_days() + 1;
        WindowSpan {
            days,
            weeks: days / 7,
            months: (days as f64 / 30.44).floor() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSpan {
    pub days: i64,
    pub weeks: i64,
    pub months: i64,
}

/// First and last capture dates a source may be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Availability {
    earliest: NaiveDate,
    latest: NaiveDate,
}

impl Availability {
    /// Availability of a collection whose observations span
    /// `[first, last]`, never earlier than 2020-01-01.
    pub fn from_range(first: NaiveDate, last: NaiveDate) -> Self {
        Availability {
            earliest: first.max(min_date()),
            latest: last,
        }
    }

    pub fn earliest(&self) -> NaiveDate {
        self.earliest
    }

    pub fn latest(&self) -> NaiveDate {
        self.latest
    }

    /// The calendar year 2023, clamped to the availability.
    pub fn default_window(&self) -> DateWindow {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(self.earliest);
        let end = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(self.latest);
        DateWindow::new(start, end).clamp_to(self)
    }
}
