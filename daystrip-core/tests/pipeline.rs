//! Feed text and agenda records through to rendered day views.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use daystrip_core::fetch::{FeedFetcher, FetchService};
use daystrip_core::protocol::{FetchRequest, SourceConfig};
use daystrip_core::{
    DayStripError, DayStripResult, DayView, Event, EventNormalizer, EventSource, EventStore,
    FixedClock, WindowSettings,
};

const NEW_YORK: Tz = Tz::America__New_York;

const FAMILY_FEED: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Family//EN\r\n\
BEGIN:VEVENT\r\n\
UID:standup@family\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=America/New_York:20260316T090000\r\n\
DTEND;TZID=America/New_York:20260316T091500\r\n\
RRULE:FREQ=DAILY\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:memorial@family\r\n\
SUMMARY:John Smith Memorial Service\r\n\
DTSTART;VALUE=DATE:20260321\r\n\
DTEND;VALUE=DATE:20260322\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

struct StaticFetcher(HashMap<&'static str, &'static str>);

impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> DayStripResult<String> {
        self.0
            .get(url)
            .map(|body| body.to_string())
            .ok_or_else(|| DayStripError::fetch(url, "HTTP 500"))
    }
}

fn now() -> DateTime<Utc> {
    // Friday 2026-03-20, noon in New York
    Utc.with_ymd_and_hms(2026, 3, 20, 16, 0, 0).unwrap()
}

fn store() -> EventStore {
    let settings = WindowSettings {
        start_day_offset: 0,
        days_to_show: 3,
        timezone: NEW_YORK,
    };
    EventStore::new(settings, Arc::new(FixedClock(now())))
}

fn sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            url: Some("https://family.example/cal.ics".to_string()),
            name: "Family".to_string(),
            color: Some("#ff8800".to_string()),
        },
        SourceConfig {
            url: Some("https://broken.example/cal.ics".to_string()),
            name: "Broken".to_string(),
            color: None,
        },
    ]
}

fn agenda_records() -> Vec<serde_json::Value> {
    serde_json::from_str(
        r#"[
            {"title": "Spring Break", "startDate": "2026-03-20", "endDate": "2026-03-21",
             "allDay": true},
            {"title": "Dentist", "startDate": "2026-03-20T14:00:00-04:00",
             "endDate": "2026-03-20T15:00:00-04:00", "calendarName": "Health"},
            {"title": "Memorial for John Smith", "startDate": "2026-03-21",
             "endDate": "2026-03-22"},
            {"title": "Standup", "startDate": "2026-03-22T09:30:00-04:00",
             "endDate": "2026-03-22T09:45:00-04:00"},
            {"title": "Quarterly review", "startDate": "2026-03-22T11:00:00-04:00",
             "endDate": "2026-03-22T12:00:00-04:00", "calendar": "Work"},
            {"title": "Backwards", "startDate": "2026-03-22T11:00:00-04:00",
             "endDate": "2026-03-22T10:00:00-04:00"}
        ]"#,
    )
    .unwrap()
}

async fn load(store: &mut EventStore) -> Vec<String> {
    let window = store.window();
    let request = FetchRequest {
        sources: sources(),
        range_start: window.start,
        range_end: window.end,
    };

    let fetcher = StaticFetcher(HashMap::from([("https://family.example/cal.ics", FAMILY_FEED)]));
    let outcome = FetchService::new(fetcher, NEW_YORK).fetch(&request).await;

    let normalizer = EventNormalizer::new(NEW_YORK);
    store.replace_source(
        EventSource::IcalFeed,
        normalizer.normalize_feed_events(&outcome.response.events),
    );
    store.replace_source(
        EventSource::AgendaFeed,
        normalizer.normalize_records(&agenda_records(), EventSource::AgendaFeed),
    );

    outcome.errors.into_iter().map(|e| e.message).collect()
}

fn titles(view: &DayView) -> Vec<&str> {
    view.events.iter().map(Event::title).collect()
}

fn hidden(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn test_day_strip_merges_feeds_and_records() {
    let mut store = store();
    let errors = load(&mut store).await;

    assert_eq!(errors, vec!["HTTP 500".to_string()]);

    let days = store.days(&hidden(&["Work"]));
    let dates: Vec<_> = days.iter().map(|d| d.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 21).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 22).unwrap(),
        ]
    );

    assert_eq!(titles(&days[0]), vec!["Spring Break", "Standup", "Dentist"]);
    assert_eq!(titles(&days[1]), vec!["John Smith Memorial Service", "Standup"]);
    assert_eq!(titles(&days[2]), vec!["Standup"]);

    // The feed copy of the standup wins over the agenda copy half an hour later
    let standup = &days[2].events[0];
    assert_eq!(standup.source(), EventSource::IcalFeed);
    assert_eq!(standup.start(), Utc.with_ymd_and_hms(2026, 3, 22, 13, 0, 0).unwrap());
    assert_eq!(standup.calendar_name(), "Family");
    assert_eq!(standup.color(), Some("#ff8800"));
}

#[tokio::test]
async fn test_hidden_calendar_reappears_when_visible() {
    let mut store = store();
    load(&mut store).await;

    let days = store.days(&HashSet::new());
    assert_eq!(titles(&days[2]), vec!["Standup", "Quarterly review"]);
}

#[tokio::test]
async fn test_refetching_a_source_leaves_others_untouched() {
    let mut store = store();
    load(&mut store).await;

    store.replace_source(EventSource::IcalFeed, Vec::new());

    assert!(store.events().iter().all(|e| e.source() == EventSource::AgendaFeed));

    let days = store.days(&HashSet::new());
    assert_eq!(titles(&days[0]), vec!["Spring Break", "Dentist"]);
    assert_eq!(titles(&days[2]), vec!["Standup", "Quarterly review"]);
    assert_eq!(days[2].events[0].source(), EventSource::AgendaFeed);
}

#[tokio::test]
async fn test_day_views_serialize_for_json_output() {
    let mut store = store();
    load(&mut store).await;

    let json = serde_json::to_value(store.days(&HashSet::new())).unwrap();
    let first = &json[0];

    assert_eq!(first["date"], "2026-03-20");
    assert_eq!(first["events"][0]["title"], "Spring Break");
    assert_eq!(first["events"][0]["allDay"], true);
    assert_eq!(first["events"][1]["startDate"], "2026-03-20T13:00:00Z");
}
