//! Core of the daystrip calendar strip.
//!
//! This crate turns calendar feeds into a short, day-bucketed agenda:
//! - `ics` and `recurrence` read ICS feeds and expand recurring events
//! - `normalize` turns loosely-shaped records into [`Event`]s
//! - `store` merges sources and answers per-day queries, using `dedup`
//!   and `similarity` to collapse the same event seen through several feeds
//! - `fetch` and `protocol` fetch feeds concurrently behind a JSON contract

pub mod clock;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod event;
pub mod fetch;
pub mod ics;
pub mod normalize;
pub mod protocol;
pub mod recurrence;
pub mod similarity;
pub mod store;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DayStripConfig;
pub use error::{DayStripError, DayStripResult};
pub use event::{Event, EventSource, EventTime};
pub use normalize::EventNormalizer;
pub use store::{DayView, EventStore, SharedEventStore};
pub use window::{Window, WindowSettings};
