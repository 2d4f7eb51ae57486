//! Cross-source duplicate detection.
//!
//! Two passes exist. [`prune_bucket_duplicates`] is a cheap exact-key filter
//! run over the whole window after every merge to bound store growth.
//! [`dedupe_day`] is the authoritative fuzzy pass run for every day query.
//! Both are first-wins: which of two duplicates survives depends only on
//! stored order.

use std::collections::HashSet;

use chrono::{NaiveDate, Timelike};

use crate::constants::{BUCKET_MINUTES, PROXIMITY_MINUTES, SIMILARITY_THRESHOLD};
use crate::event::Event;
use crate::similarity::{normalize_title, title_similarity};
use crate::window::Window;

/// An event paired with its title signature, computed once per pass.
struct Signed<'a> {
    event: &'a Event,
    signature: String,
}

impl<'a> Signed<'a> {
    fn new(event: &'a Event) -> Self {
        Signed {
            event,
            signature: normalize_title(event.title()),
        }
    }
}

/// Whether `a` and `b` describe the same real-world event on `day`.
pub fn is_duplicate_for_day(a: &Event, b: &Event, day: &Window) -> bool {
    signed_duplicates(&Signed::new(a), &Signed::new(b), day)
}

fn signed_duplicates(a: &Signed, b: &Signed, day: &Window) -> bool {
    if a.signature.is_empty() || b.signature.is_empty() {
        return false;
    }
    if title_similarity(&a.signature, &b.signature) < SIMILARITY_THRESHOLD {
        return false;
    }

    // All-day entries match on title alone
    if a.event.is_all_day() || b.event.is_all_day() {
        return true;
    }

    let distance = (a.event.start() - b.event.start()).num_minutes().abs();
    if distance > PROXIMITY_MINUTES {
        return false;
    }

    let date = day.first_day();
    day.local_date(a.event.start()) == date || day.local_date(b.event.start()) == date
}

/// Greedy per-day pass: keep each event unless it duplicates one already kept.
///
/// Identical titles get no shortcut: timed copies still need the proximity
/// check, so the same title at 09:00 and 15:00 shows twice.
pub fn dedupe_day<'a>(
    events: impl IntoIterator<Item = &'a Event>,
    day: &Window,
) -> Vec<&'a Event> {
    let mut kept: Vec<Signed<'a>> = Vec::new();

    for event in events {
        let candidate = Signed::new(event);
        if !kept.iter().any(|k| signed_duplicates(&candidate, k, day)) {
            kept.push(candidate);
        }
    }

    kept.into_iter().map(|s| s.event).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Bucket {
    AllDay,
    Minutes(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    day: NaiveDate,
    signature: String,
    start: Bucket,
    duration: Bucket,
}

fn bucket_key(event: &Event, signature: String, window: &Window) -> BucketKey {
    let day = window.local_date(event.start()).max(window.first_day());

    let (start, duration) = if event.is_all_day() {
        (Bucket::AllDay, Bucket::AllDay)
    } else {
        let local = event.start().with_timezone(&window.timezone());
        let minute_of_day = i64::from(local.hour()) * 60 + i64::from(local.minute());
        let floored = minute_of_day / BUCKET_MINUTES * BUCKET_MINUTES;

        let minutes = event.duration().num_minutes() as f64;
        let rounded = (minutes / BUCKET_MINUTES as f64).round() as i64 * BUCKET_MINUTES;

        (Bucket::Minutes(floored), Bucket::Minutes(rounded))
    };

    BucketKey {
        day,
        signature,
        start,
        duration,
    }
}

/// Window-wide exact-bucket pass.
///
/// Events sharing (clamped start day, signature, 15-minute start bucket,
/// 15-minute rounded duration) collapse to the first one. Events whose
/// signature is empty are always kept.
pub fn prune_bucket_duplicates(events: Vec<Event>, window: &Window) -> Vec<Event> {
    let mut seen: HashSet<BucketKey> = HashSet::new();

    events
        .into_iter()
        .filter(|event| {
            let signature = normalize_title(event.title());
            if signature.is_empty() {
                return true;
            }
            seen.insert(bucket_key(event, signature, window))
        })
        .collect()
}
