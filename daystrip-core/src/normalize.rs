//! Mapping of loosely-shaped source records onto [`Event`].
//!
//! Calendar-module and agenda payloads arrive as JSON objects whose field
//! names vary between providers; each canonical field is read from the first
//! alias present. Records that cannot yield a valid start/end are dropped.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::event::{Event, EventSource, localize};
use crate::protocol::FeedEvent;

const TITLE_FIELDS: &[&str] = &["title", "summary", "date"];
const START_FIELDS: &[&str] = &["startDate", "start", "date"];
const END_FIELDS: &[&str] = &["endDate", "end"];
const CALENDAR_FIELDS: &[&str] = &["calendarName", "calendar"];
const ALL_DAY_FLAGS: &[&str] = &["allDay", "fullDayEvent"];
const COLOR_FIELDS: &[&str] = &[
    "bgColor",
    "backgroundColor",
    "color",
    "calendarColor",
    "colorSource",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// A timestamp read from a record, with how it was written.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ParsedTime {
    at: DateTime<Utc>,
    /// Written with an explicit offset or zone.
    annotated: bool,
    /// Written as a bare calendar date.
    date_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct EventNormalizer {
    tz: Tz,
}

impl EventNormalizer {
    /// `tz` is the zone naive timestamps and dates are read in.
    pub fn new(tz: Tz) -> Self {
        EventNormalizer { tz }
    }

    /// Normalize a batch, silently dropping invalid records.
    pub fn normalize_records(&self, records: &[Value], source: EventSource) -> Vec<Event> {
        let events: Vec<Event> = records
            .iter()
            .filter_map(|r| self.normalize_record(r, source))
            .collect();

        tracing::debug!(
            source = %source,
            received = records.len(),
            kept = events.len(),
            "normalized records"
        );
        events
    }

    /// Map one raw record to an event, or `None` if its dates are unusable.
    pub fn normalize_record(&self, record: &Value, source: EventSource) -> Option<Event> {
        let start_raw = first_present(record, START_FIELDS)?;
        let end_raw = first_present(record, END_FIELDS).unwrap_or(start_raw);

        let start = self.parse_time(start_raw)?;
        let end = self.parse_time(end_raw)?;

        let title = first_str(record, TITLE_FIELDS)
            .map(collapse_whitespace)
            .unwrap_or_default();

        let all_day = ALL_DAY_FLAGS.iter().any(|f| record.get(*f).is_some_and(is_truthy))
            || record.get("datetype").and_then(Value::as_str) == Some("date")
            || start.date_only
            || (!start.annotated
                && !end.annotated
                && self.is_local_midnight(start.at)
                && self.is_local_midnight(end.at));

        let event = Event::new(title, start.at, end.at, source)
            .inspect_err(|e| tracing::debug!(source = %source, error = %e, "dropping record"))
            .ok()?;

        Some(
            event
                .with_calendar(first_str(record, CALENDAR_FIELDS).unwrap_or_default())
                .with_all_day(all_day)
                .with_color(first_str(record, COLOR_FIELDS).map(String::from)),
        )
    }

    /// Map an already-expanded feed item to an event.
    pub fn normalize_feed_event(&self, item: &FeedEvent) -> Option<Event> {
        let event = Event::new(
            collapse_whitespace(&item.title),
            item.start_date,
            item.end_date,
            EventSource::IcalFeed,
        )
        .inspect_err(|e| tracing::debug!(error = %e, "dropping feed item"))
        .ok()?;

        Some(
            event
                .with_calendar(item.calendar_name.clone())
                .with_all_day(item.all_day)
                .with_color(item.color.clone()),
        )
    }

    pub fn normalize_feed_events(&self, items: &[FeedEvent]) -> Vec<Event> {
        items
            .iter()
            .filter_map(|i| self.normalize_feed_event(i))
            .collect()
    }

    fn is_local_midnight(&self, at: DateTime<Utc>) -> bool {
        at.with_timezone(&self.tz).time() == NaiveTime::MIN
    }

    fn parse_time(&self, value: &Value) -> Option<ParsedTime> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .and_then(epoch_millis),
            Value::String(s) => self.parse_time_str(s.trim()),
            _ => None,
        }
    }

    fn parse_time_str(&self, s: &str) -> Option<ParsedTime> {
        if s.len() >= 10 && s.chars().all(|c| c.is_ascii_digit()) {
            return s.parse::<i64>().ok().and_then(epoch_millis);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(ParsedTime {
                at: dt.with_timezone(&Utc),
                annotated: true,
                date_only: false,
            });
        }

        if let Some(naive) = NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        {
            return Some(ParsedTime {
                at: localize(self.tz, naive)?,
                annotated: false,
                date_only: false,
            });
        }

        let date = DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(s, f).ok())?;
        Some(ParsedTime {
            at: localize(self.tz, date.and_time(NaiveTime::MIN))?,
            annotated: false,
            date_only: true,
        })
    }
}

/// Epoch milliseconds, as emitted by calendar-module style sources.
fn epoch_millis(ms: i64) -> Option<ParsedTime> {
    Some(ParsedTime {
        at: DateTime::from_timestamp_millis(ms)?,
        annotated: false,
        date_only: false,
    })
}

/// First alias holding a non-null, non-empty value.
fn first_present<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|f| record.get(*f))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn first_str<'a>(record: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| record.get(*f).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
