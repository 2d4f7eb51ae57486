//! ICS feed reading.
//!
//! Turns the text of one feed into the flat, already-expanded items of the
//! fetch contract (see [`crate::protocol::FeedEvent`]).

mod parse;

pub use parse::parse_calendar;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{DayStripError, DayStripResult};
use crate::event::EventTime;
use crate::protocol::{FeedEvent, SourceConfig};
use crate::recurrence::expand_occurrences;

/// A VEVENT as read from a feed, before expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct IcsEvent {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    /// Raw RRULE value, if the event recurs.
    pub rrule: Option<String>,
}

impl IcsEvent {
    /// Whole-day values, or floating start and end both sitting on midnight.
    pub fn is_all_day(&self) -> bool {
        self.start.is_date()
            || (self.start.is_floating_midnight() && self.end.is_floating_midnight())
    }
}

/// Read one feed and expand every event into the items overlapping
/// `[range_start, range_end]`.
///
/// Any unparseable content or recurrence rule fails the whole feed.
pub fn read_feed(
    text: &str,
    source: &SourceConfig,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    local: Tz,
) -> DayStripResult<Vec<FeedEvent>> {
    if !text.contains("BEGIN:VCALENDAR") {
        return Err(DayStripError::IcsParse("Invalid ICS content".into()));
    }

    let mut items = Vec::new();

    for event in parse_calendar(text)? {
        let all_day = event.is_all_day();
        for occurrence in expand_occurrences(&event, range_start, range_end, local)? {
            items.push(FeedEvent {
                title: event.summary.clone(),
                calendar_name: source.name.clone(),
                start_date: occurrence.start,
                end_date: occurrence.end,
                all_day,
                color: source.color.clone(),
            });
        }
    }

    Ok(items)
}
