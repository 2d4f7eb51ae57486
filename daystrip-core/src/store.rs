//! The merged, cross-source event set.
//!
//! Sources replace their own contribution wholesale on every refetch; day
//! queries apply the fuzzy duplicate pass and return a display-ready order.
//! Mutation takes `&mut self` and queries take `&self`, so sharing the store
//! behind a [`SharedEventStore`] lock keeps every replacement atomic with
//! respect to readers.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::constants::FALLBACK_CALENDAR_NAME;
use crate::dedup::{dedupe_day, prune_bucket_duplicates};
use crate::event::{Event, EventSource};
use crate::window::{Window, WindowSettings};

pub type SharedEventStore = Arc<RwLock<EventStore>>;

pub struct EventStore {
    events: Vec<Event>,
    loaded: bool,
    settings: WindowSettings,
    clock: Arc<dyn Clock>,
}

impl EventStore {
    pub fn new(settings: WindowSettings, clock: Arc<dyn Clock>) -> Self {
        EventStore {
            events: Vec::new(),
            loaded: false,
            settings,
            clock,
        }
    }

    pub fn shared(self) -> SharedEventStore {
        Arc::new(RwLock::new(self))
    }

    /// The display window as of the store's clock.
    pub fn window(&self) -> Window {
        Window::compute(self.clock.now(), &self.settings)
    }

    pub fn settings(&self) -> &WindowSettings {
        &self.settings
    }

    /// Whether any source has been merged yet.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every retained event in stored order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drop everything previously merged from `source`, then append the
    /// in-window part of `events` and run the window-wide bucket prune.
    pub fn replace_source(&mut self, source: EventSource, events: Vec<Event>) {
        let window = self.window();
        let before = self.events.len();

        self.events.retain(|e| e.source() != source);
        let removed = before - self.events.len();

        let incoming = window.retain(events);
        let added = incoming.len();
        self.events.extend(incoming);

        let merged = std::mem::take(&mut self.events);
        self.events = prune_bucket_duplicates(merged, &window);
        self.loaded = true;

        tracing::debug!(
            source = %source,
            removed,
            added,
            retained = self.events.len(),
            "replaced source events"
        );
    }

    /// Events overlapping `day` whose calendar is not hidden, deduplicated
    /// first-wins and ordered all-day first, then by start (stable).
    pub fn query_day(&self, day: &Window, hidden_calendars: &HashSet<String>) -> Vec<Event> {
        let visible = self
            .events
            .iter()
            .filter(|e| !is_hidden(e, hidden_calendars))
            .filter(|e| day.contains(e));

        let mut result: Vec<Event> = dedupe_day(visible, day).into_iter().cloned().collect();
        result.sort_by(|a, b| {
            b.is_all_day()
                .cmp(&a.is_all_day())
                .then_with(|| a.start().cmp(&b.start()))
        });
        result
    }

    /// One view per day of the current window.
    pub fn days(&self, hidden_calendars: &HashSet<String>) -> Vec<DayView> {
        self.window()
            .days()
            .iter()
            .map(|day| DayView {
                date: day.first_day(),
                events: self.query_day(day, hidden_calendars),
            })
            .collect()
    }
}

/// Calendar labels match case-insensitively; unnamed events count as "Calendar".
fn is_hidden(event: &Event, hidden_calendars: &HashSet<String>) -> bool {
    if hidden_calendars.is_empty() {
        return false;
    }
    let name = match event.calendar_name() {
        "" => FALLBACK_CALENDAR_NAME,
        name => name,
    }
    .to_lowercase();

    hidden_calendars.iter().any(|h| h.to_lowercase() == name)
}

/// The events of one displayed day.
#[derive(Debug, Clone, Serialize)]
pub struct DayView {
    pub date: NaiveDate,
    pub events: Vec<Event>,
}

impl DayView {
    /// The first `max` events and how many more did not fit.
    pub fn visible(&self, max: usize) -> (&[Event], usize) {
        let shown = self.events.len().min(max);
        (&self.events[..shown], self.events.len() - shown)
    }

    /// Rough load indicator: timed events weigh 0.2, all-day 0.35, capped at 1.2.
    pub fn busy_score(&self) -> f64 {
        let all_day = self.events.iter().filter(|e| e.is_all_day()).count();
        let timed = self.events.len() - all_day;
        (timed as f64 * 0.2 + all_day as f64 * 0.35).min(1.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use chrono_tz::Tz;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    fn store() -> EventStore {
        let settings = WindowSettings {
            start_day_offset: 0,
            days_to_show: 3,
            timezone: Tz::UTC,
        };
        EventStore::new(settings, Arc::new(FixedClock(utc(20, 8, 0))))
    }

    fn today() -> Window {
        Window::for_day(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(), Tz::UTC)
    }

    fn timed(title: &str, h: u32, m: u32, source: EventSource) -> Event {
        let start = utc(20, h, m);
        Event::new(title, start, start + Duration::hours(1), source).unwrap()
    }

    fn all_day(title: &str, source: EventSource) -> Event {
        Event::new(title, utc(20, 0, 0), utc(21, 0, 0), source)
            .unwrap()
            .with_all_day(true)
    }

    fn titles(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.title()).collect()
    }

    fn none() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_replace_is_idempotent() {
        let events = vec![
            timed("Standup", 9, 0, EventSource::IcalFeed),
            all_day("Spring Break", EventSource::IcalFeed),
        ];

        let mut once = store();
        once.replace_source(EventSource::IcalFeed, events.clone());

        let mut twice = store();
        twice.replace_source(EventSource::IcalFeed, events.clone());
        twice.replace_source(EventSource::IcalFeed, events);

        assert_eq!(once.query_day(&today(), &none()), twice.query_day(&today(), &none()));
        assert_eq!(once.len(), twice.len());
        assert!(twice.is_loaded());
    }

    #[test]
    fn test_replace_only_touches_its_own_source() {
        let mut store = store();
        store.replace_source(
            EventSource::IcalFeed,
            vec![timed("Dentist", 9, 0, EventSource::IcalFeed)],
        );
        store.replace_source(
            EventSource::AgendaFeed,
            vec![timed("Piano", 16, 0, EventSource::AgendaFeed)],
        );
        store.replace_source(EventSource::IcalFeed, Vec::new());

        assert_eq!(titles(store.events()), vec!["Piano"]);
    }

    #[test]
    fn test_replace_drops_out_of_window_events() {
        let mut store = store();
        let stale =
            Event::new("Last week", utc(10, 9, 0), utc(10, 10, 0), EventSource::AgendaFeed)
                .unwrap();
        store.replace_source(
            EventSource::AgendaFeed,
            vec![stale, timed("Now", 9, 0, EventSource::AgendaFeed)],
        );

        assert_eq!(titles(store.events()), vec!["Now"]);
    }

    #[test]
    fn test_cross_source_memorial_is_shown_once() {
        let mut store = store();
        store.replace_source(
            EventSource::IcalFeed,
            vec![all_day("John Smith Memorial Service", EventSource::IcalFeed)],
        );
        store.replace_source(
            EventSource::AgendaFeed,
            vec![all_day("Memorial for John Smith", EventSource::AgendaFeed)],
        );

        let day = store.query_day(&today(), &none());
        assert_eq!(titles(&day), vec!["John Smith Memorial Service"]);
    }

    #[test]
    fn test_duplicates_coexist_in_store_but_not_in_a_day() {
        let mut store = store();
        store.replace_source(
            EventSource::IcalFeed,
            vec![all_day("Funeral: John Smith", EventSource::IcalFeed)],
        );
        store.replace_source(
            EventSource::AgendaFeed,
            vec![timed("John Smith funeral service", 10, 0, EventSource::AgendaFeed)],
        );

        assert_eq!(store.len(), 2);
        assert_eq!(titles(&store.query_day(&today(), &none())), vec!["Funeral: John Smith"]);
    }

    #[test]
    fn test_similar_titles_hours_apart_are_both_kept() {
        let mut store = store();
        store.replace_source(
            EventSource::IcalFeed,
            vec![
                timed("Team standup", 9, 0, EventSource::IcalFeed),
                timed("Standup team", 12, 0, EventSource::IcalFeed),
            ],
        );

        assert_eq!(store.query_day(&today(), &none()).len(), 2);
    }

    #[test]
    fn test_all_day_first_then_by_start() {
        let mut store = store();
        store.replace_source(
            EventSource::AgendaFeed,
            vec![
                timed("Afternoon", 14, 0, EventSource::AgendaFeed),
                timed("Morning", 9, 0, EventSource::AgendaFeed),
                all_day("Holiday", EventSource::AgendaFeed),
            ],
        );

        let day = store.query_day(&today(), &none());
        assert_eq!(titles(&day), vec!["Holiday", "Morning", "Afternoon"]);
    }

    #[test]
    fn test_equal_starts_keep_insertion_order() {
        let mut store = store();
        store.replace_source(
            EventSource::AgendaFeed,
            vec![
                timed("Zumba", 9, 0, EventSource::AgendaFeed),
                timed("Algebra", 9, 0, EventSource::AgendaFeed),
            ],
        );

        assert_eq!(titles(&store.query_day(&today(), &none())), vec!["Zumba", "Algebra"]);
    }

    #[test]
    fn test_hidden_calendars_are_filtered() {
        let mut store = store();
        store.replace_source(
            EventSource::AgendaFeed,
            vec![
                timed("Review", 9, 0, EventSource::AgendaFeed).with_calendar("Work"),
                timed("Nap", 13, 0, EventSource::AgendaFeed),
                timed("Soccer", 17, 0, EventSource::AgendaFeed).with_calendar("Kids"),
            ],
        );

        let hidden: HashSet<String> = ["work".to_string(), "Calendar".to_string()].into();
        assert_eq!(titles(&store.query_day(&today(), &hidden)), vec!["Soccer"]);
    }

    #[test]
    fn test_query_does_not_mutate() {
        let mut store = store();
        store.replace_source(
            EventSource::AgendaFeed,
            vec![
                all_day("Spring County Fair", EventSource::AgendaFeed),
                all_day("County Fair spring day", EventSource::AgendaFeed),
            ],
        );

        assert_eq!(store.query_day(&today(), &none()).len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_days_cover_window_with_multi_day_events() {
        let mut store = store();
        let trip = Event::new("Trip", utc(20, 0, 0), utc(22, 0, 0), EventSource::AgendaFeed)
            .unwrap()
            .with_all_day(true);
        store.replace_source(EventSource::AgendaFeed, vec![trip]);

        let days = store.days(&none());
        let counts: Vec<_> = days.iter().map(|d| d.events.len()).collect();
        assert_eq!(counts, vec![1, 1, 0]);
        assert_eq!(days[2].date, NaiveDate::from_ymd_opt(2026, 3, 22).unwrap());
    }

    #[test]
    fn test_day_view_overflow_and_busy_score() {
        let view = DayView {
            date: NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            events: vec![
                all_day("Holiday", EventSource::AgendaFeed),
                timed("A", 9, 0, EventSource::AgendaFeed),
                timed("B", 10, 0, EventSource::AgendaFeed),
            ],
        };

        let (shown, overflow) = view.visible(2);
        assert_eq!(shown.len(), 2);
        assert_eq!(overflow, 1);
        assert!((view.busy_score() - 0.75).abs() < 1e-9);
    }
}
