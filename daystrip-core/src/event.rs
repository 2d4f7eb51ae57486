//! Canonical event shape shared by every source.
//!
//! Records from ICS feeds, calendar-module payloads and agenda lists are all
//! normalized into [`Event`]. An `Event` is never mutated after construction;
//! the store only ever appends or drops whole events.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DayStripError, DayStripResult};

/// Where an event came from. Used for source-scoped replacement only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventSource {
    /// Events pushed by a host calendar module.
    CalendarModule,
    /// Events read from the configured ICS feeds.
    IcalFeed,
    /// Pre-parsed agenda lists from another provider.
    AgendaFeed,
}

impl EventSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::CalendarModule => "calendar",
            EventSource::IcalFeed => "ical",
            EventSource::AgendaFeed => "agenda",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized calendar event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    title: String,
    calendar_name: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    all_day: bool,
    color: Option<String>,
    source: EventSource,
}

impl Event {
    /// Build an event, rejecting it when `end` precedes `start`.
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: EventSource,
    ) -> DayStripResult<Self> {
        let title = title.into();
        if end < start {
            return Err(DayStripError::InvalidEvent(format!(
                "'{}' ends ({}) before it starts ({})",
                title, end, start
            )));
        }

        Ok(Event {
            title,
            calendar_name: String::new(),
            start_date: start,
            end_date: end,
            all_day: false,
            color: None,
            source,
        })
    }

    pub fn with_calendar(mut self, name: impl Into<String>) -> Self {
        self.calendar_name = name.into();
        self
    }

    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn calendar_name(&self) -> &str {
        &self.calendar_name
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end_date
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn source(&self) -> EventSource {
        self.source
    }

    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }

    /// Half-open overlap test against `[start, end)`.
    ///
    /// Zero-length events count as instants and overlap when they fall inside
    /// the interval.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if self.start_date == self.end_date {
            return self.start_date >= start && self.start_date < end;
        }
        self.start_date < end && self.end_date > start
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// A DTSTART/DTEND value as written in a feed, before it is pinned to an instant.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Resolve to an instant. Dates and floating times are read in `local`;
    /// zoned times use their TZID when it is a known IANA zone.
    pub fn to_utc(&self, local: Tz) -> Option<DateTime<Utc>> {
        match self {
            EventTime::Date(d) => localize(local, d.and_time(NaiveTime::MIN)),
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeFloating(dt) => localize(local, *dt),
            EventTime::DateTimeZoned { datetime, .. } => localize(self.zone(local), *datetime),
        }
    }

    /// The zone this value is expressed in. Unknown TZIDs and values without
    /// one map to `fallback`.
    pub fn zone(&self, fallback: Tz) -> Tz {
        match self {
            EventTime::DateTimeZoned { tzid, .. } => tzid.parse::<Tz>().unwrap_or(fallback),
            EventTime::DateTimeUtc(_) => Tz::UTC,
            _ => fallback,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Floating value sitting exactly on midnight.
    pub fn is_floating_midnight(&self) -> bool {
        match self {
            EventTime::Date(_) => true,
            EventTime::DateTimeFloating(dt) => dt.time() == NaiveTime::MIN,
            _ => false,
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

/// Pin a wall-clock time to an instant in `tz`.
///
/// Ambiguous times take the earlier instant; times inside a DST gap are
/// shifted forward by an hour.
pub fn localize(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
