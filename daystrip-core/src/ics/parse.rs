//! ICS parsing using the icalendar crate's parser.

use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use crate::error::{DayStripError, DayStripResult};
use crate::event::EventTime;
use crate::ics::IcsEvent;

/// Parse every VEVENT in a feed.
///
/// Events without a usable DTSTART are skipped; a missing DTEND falls back to
/// DTSTART. Instance overrides (RECURRENCE-ID) are skipped.
pub fn parse_calendar(content: &str) -> DayStripResult<Vec<IcsEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| DayStripError::IcsParse(e.to_string()))?;

    let events = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter(|c| c.find_prop("RECURRENCE-ID").is_none())
        .filter_map(parse_vevent)
        .collect();

    Ok(events)
}

fn parse_vevent(vevent: &Component) -> Option<IcsEvent> {
    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time)
        .unwrap_or_else(|| start.clone());

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_default();

    let rrule = vevent
        .find_prop("RRULE")
        .map(|p| p.val.to_string())
        .filter(|r| !r.trim().is_empty());

    Some(IcsEvent {
        summary,
        start,
        end,
        rrule,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => EventTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
