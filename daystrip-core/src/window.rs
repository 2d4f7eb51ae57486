//! The rolling display window and per-day intervals.
//!
//! All intervals are half-open `[start, end)` instants; `end` is the local
//! midnight following the last covered day.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::constants::DEFAULT_DAYS_TO_SHOW;
use crate::event::{Event, localize};

/// How the window is derived from "now".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSettings {
    /// Days from today to the first displayed day. May be negative.
    pub start_day_offset: i64,
    pub days_to_show: u32,
    pub timezone: Tz,
}

impl Default for WindowSettings {
    fn default() -> Self {
        WindowSettings {
            start_day_offset: 0,
            days_to_show: DEFAULT_DAYS_TO_SHOW,
            timezone: Tz::UTC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    tz: Tz,
}

impl Window {
    /// Window starting at local midnight of `now + offset` and spanning
    /// `days_to_show` whole local days.
    pub fn compute(now: DateTime<Utc>, settings: &WindowSettings) -> Self {
        let tz = settings.timezone;
        let today = now.with_timezone(&tz).date_naive();
        let first = shift_date(today, settings.start_day_offset);
        Window::spanning(first, settings.days_to_show.max(1), tz)
    }

    /// The single local day `date`.
    pub fn for_day(date: NaiveDate, tz: Tz) -> Self {
        Window::spanning(date, 1, tz)
    }

    fn spanning(first: NaiveDate, days: u32, tz: Tz) -> Self {
        let last_exclusive = first
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);

        Window {
            start: start_of_day(tz, first),
            end: start_of_day(tz, last_exclusive),
            tz,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn first_day(&self) -> NaiveDate {
        self.local_date(self.start)
    }

    /// Local calendar date of an instant in this window's zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// One single-day window per local day covered.
    pub fn days(&self) -> Vec<Window> {
        let last = self.local_date(self.end);
        self.first_day()
            .iter_days()
            .take_while(|d| *d < last)
            .map(|d| Window::for_day(d, self.tz))
            .collect()
    }

    pub fn contains(&self, event: &Event) -> bool {
        event.overlaps(self.start, self.end)
    }

    /// Keep only events overlapping the window, preserving order.
    pub fn retain(&self, events: Vec<Event>) -> Vec<Event> {
        events.into_iter().filter(|e| self.contains(e)).collect()
    }
}

/// Local midnight of `date` in `tz` as an instant.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    localize(tz, midnight).unwrap_or_else(|| midnight.and_utc())
}

fn shift_date(date: NaiveDate, offset: i64) -> NaiveDate {
    let days = Days::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.unwrap_or(date)
}
