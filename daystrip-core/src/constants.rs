/// Minimum title similarity for two events to be considered the same.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// Maximum start-time distance for two timed events to be considered the same.
pub const PROXIMITY_MINUTES: i64 = 45;

/// Granularity of the start and duration buckets in the window-wide prune.
pub const BUCKET_MINUTES: i64 = 15;

pub const DEFAULT_DAYS_TO_SHOW: u32 = 5;

pub const DEFAULT_MAX_EVENTS_PER_DAY: usize = 4;

pub const DEFAULT_UPDATE_INTERVAL: &str = "10m";

/// Upper bound on occurrences generated per recurring event.
pub const MAX_OCCURRENCES: u16 = 1000;

/// Label used for visibility checks when an event has no calendar name.
pub const FALLBACK_CALENDAR_NAME: &str = "Calendar";

pub const USER_AGENT: &str = concat!("daystrip/", env!("CARGO_PKG_VERSION"));
