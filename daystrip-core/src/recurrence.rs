//! RRULE expansion for recurring feed events.
//!
//! Expands a feed event into concrete occurrences inside a date range. Each
//! occurrence keeps the duration of the base event.

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::constants::MAX_OCCURRENCES;
use crate::error::{DayStripError, DayStripResult};
use crate::event::{EventTime, localize};
use crate::ics::IcsEvent;

/// One concrete instance of a feed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Build an iCalendar-format DTSTART/RRULE block for the rrule crate parser.
fn build_rrule_string(start: &EventTime, rrule: &str, local: Tz) -> String {
    let dtstart = match start {
        EventTime::DateTimeUtc(dt) => format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::Date(d) if local == Tz::UTC => {
            format!("DTSTART:{}T000000Z", d.format("%Y%m%d"))
        }
        EventTime::Date(d) => {
            format!("DTSTART;TZID={}:{}T000000", local.name(), d.format("%Y%m%d"))
        }
        EventTime::DateTimeFloating(dt) => format!(
            "DTSTART;TZID={}:{}",
            local.name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
        EventTime::DateTimeZoned { datetime, .. } => format!(
            "DTSTART;TZID={}:{}",
            start.zone(local).name(),
            datetime.format("%Y%m%dT%H%M%S")
        ),
    };

    format!("{}\nRRULE:{}", dtstart, widen_until(rrule))
}

/// Date-only and floating UNTIL values are not accepted next to a zoned
/// DTSTART; pin them to UTC, widening dates to the end of that day.
fn widen_until(rrule: &str) -> String {
    rrule
        .trim()
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                if value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()) {
                    format!("UNTIL={}T235959Z", value)
                } else if !value.ends_with('Z') {
                    format!("UNTIL={}Z", value)
                } else {
                    part.to_string()
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Expand `event` into its occurrences within `[range_start, range_end]` (inclusive).
///
/// Without a rule, the base occurrence is returned when it overlaps the range.
/// A rule that fails to parse is an error for the whole feed.
pub fn expand_occurrences(
    event: &IcsEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    local: Tz,
) -> DayStripResult<Vec<Occurrence>> {
    let (Some(base_start), Some(base_end)) = (event.start.to_utc(local), event.end.to_utc(local))
    else {
        return Ok(Vec::new());
    };

    let Some(rrule) = event.rrule.as_deref() else {
        if base_end >= range_start && base_start <= range_end {
            return Ok(vec![Occurrence {
                start: base_start,
                end: base_end.max(base_start),
            }]);
        }
        return Ok(Vec::new());
    };

    let rrule_set: RRuleSet = build_rrule_string(&event.start, rrule, local)
        .parse()
        .map_err(|e| {
            DayStripError::Recurrence(format!(
                "Failed to parse RRULE for event '{}': {}",
                event.summary, e
            ))
        })?;

    // after/before are exclusive; widen by a second to make the range inclusive
    let tz: rrule::Tz = Utc.into();
    let after = (range_start - Duration::seconds(1)).with_timezone(&tz);
    let before = (range_end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    let duration = (base_end - base_start).max(Duration::zero());

    let occurrences = result
        .dates
        .iter()
        .map(|dt| {
            let start = dt.with_timezone(&Utc);
            let end = match (&event.start, &event.end) {
                // Whole-day masters keep their day count so DST shifts don't
                // push the end past local midnight
                (EventTime::Date(d_start), EventTime::Date(d_end)) => {
                    let span = Days::new((*d_end - *d_start).num_days().max(0) as u64);
                    dt.date_naive()
                        .checked_add_days(span)
                        .and_then(|d| localize(local, d.and_time(NaiveTime::MIN)))
                        .unwrap_or(start + duration)
                }
                _ => start + duration,
            };
            Occurrence { start, end }
        })
        .filter(|occ| occ.start >= range_start && occ.start <= range_end)
        .collect();

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn feed_event(start: EventTime, end: EventTime, rrule: Option<&str>) -> IcsEvent {
        IcsEvent {
            summary: "Recurring".to_string(),
            start,
            end,
            rrule: rrule.map(String::from),
        }
    }

    #[test]
    fn test_expansion_preserves_duration() {
        let event = feed_event(
            EventTime::DateTimeUtc(utc(2026, 3, 2, 9, 0)),
            EventTime::DateTimeUtc(utc(2026, 3, 2, 10, 30)),
            Some("FREQ=DAILY"),
        );

        let occurrences =
            expand_occurrences(&event, utc(2026, 3, 10, 0, 0), utc(2026, 3, 14, 23, 59), Tz::UTC)
                .unwrap();

        assert_eq!(occurrences.len(), 5);
        for occ in &occurrences {
            assert_eq!(occ.end - occ.start, Duration::minutes(90));
        }
        assert_eq!(occurrences[0].start, utc(2026, 3, 10, 9, 0));
    }

    #[test]
    fn test_range_is_inclusive() {
        let event = feed_event(
            EventTime::DateTimeUtc(utc(2026, 3, 2, 9, 0)),
            EventTime::DateTimeUtc(utc(2026, 3, 2, 10, 0)),
            Some("FREQ=WEEKLY"),
        );

        let occurrences =
            expand_occurrences(&event, utc(2026, 3, 9, 9, 0), utc(2026, 3, 16, 9, 0), Tz::UTC)
                .unwrap();

        let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
        assert_eq!(starts, vec![utc(2026, 3, 9, 9, 0), utc(2026, 3, 16, 9, 0)]);
    }

    #[test]
    fn test_floating_rule_follows_local_zone_across_dst() {
        let tz: Tz = "America/New_York".parse().unwrap();
        let base = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let event = feed_event(
            EventTime::DateTimeFloating(base.and_hms_opt(9, 0, 0).unwrap()),
            EventTime::DateTimeFloating(base.and_hms_opt(10, 0, 0).unwrap()),
            Some("FREQ=WEEKLY;COUNT=3"),
        );

        let occurrences =
            expand_occurrences(&event, utc(2026, 3, 1, 0, 0), utc(2026, 3, 31, 0, 0), tz).unwrap();

        // EST before March 8th, EDT after
        let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
        assert_eq!(
            starts,
            vec![utc(2026, 3, 2, 14, 0), utc(2026, 3, 9, 13, 0), utc(2026, 3, 16, 13, 0)]
        );
    }

    #[test]
    fn test_all_day_rule_with_date_until() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let event = feed_event(
            EventTime::Date(day),
            EventTime::Date(day.succ_opt().unwrap()),
            Some("FREQ=WEEKLY;UNTIL=20260316"),
        );

        let occurrences =
            expand_occurrences(&event, utc(2026, 3, 1, 0, 0), utc(2026, 3, 31, 0, 0), Tz::UTC)
                .unwrap();

        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[2].end, utc(2026, 3, 17, 0, 0));
    }

    #[test]
    fn test_without_rule_returns_base_when_overlapping() {
        let event = feed_event(
            EventTime::DateTimeUtc(utc(2026, 3, 9, 8, 0)),
            EventTime::DateTimeUtc(utc(2026, 3, 9, 9, 0)),
            None,
        );

        let inside =
            expand_occurrences(&event, utc(2026, 3, 9, 0, 0), utc(2026, 3, 10, 0, 0), Tz::UTC)
                .unwrap();
        let outside =
            expand_occurrences(&event, utc(2026, 3, 10, 0, 0), utc(2026, 3, 11, 0, 0), Tz::UTC)
                .unwrap();

        assert_eq!(inside.len(), 1);
        assert!(outside.is_empty());
    }

    #[test]
    fn test_malformed_rule_is_an_error() {
        let event = feed_event(
            EventTime::DateTimeUtc(utc(2026, 3, 9, 8, 0)),
            EventTime::DateTimeUtc(utc(2026, 3, 9, 9, 0)),
            Some("FREQ=SOMETIMES"),
        );

        let result =
            expand_occurrences(&event, utc(2026, 3, 9, 0, 0), utc(2026, 3, 10, 0, 0), Tz::UTC);
        assert!(matches!(result, Err(DayStripError::Recurrence(_))));
    }

    #[test]
    fn test_widen_until() {
        assert_eq!(widen_until("FREQ=DAILY;UNTIL=20260316"), "FREQ=DAILY;UNTIL=20260316T235959Z");
        assert_eq!(
            widen_until("FREQ=DAILY;UNTIL=20260316T100000"),
            "FREQ=DAILY;UNTIL=20260316T100000Z"
        );
        assert_eq!(widen_until("FREQ=DAILY;COUNT=2"), "FREQ=DAILY;COUNT=2");
    }
}
