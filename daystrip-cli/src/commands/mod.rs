pub mod config;
pub mod fetch;
pub mod show;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use daystrip_core::fetch::FetchService;
use daystrip_core::protocol::FetchRequest;
use daystrip_core::{
    DayStripConfig, EventNormalizer, EventSource, EventStore, SharedEventStore, SystemClock,
};
use serde_json::Value;

use crate::http::HttpFetcher;

/// Everything a running command needs, resolved once from the config.
pub struct Session {
    pub config: DayStripConfig,
    pub timezone: Tz,
    pub store: SharedEventStore,
    pub fetcher: Arc<FetchService<HttpFetcher>>,
}

impl Session {
    pub fn new(config: DayStripConfig) -> Result<Self> {
        let timezone = config.timezone(system_timezone())?;
        let store =
            EventStore::new(config.window_settings(timezone), Arc::new(SystemClock)).shared();
        let fetcher = Arc::new(FetchService::new(HttpFetcher::new()?, timezone));

        Ok(Self {
            config,
            timezone,
            store,
            fetcher,
        })
    }

    /// Refetch every feed and reload every record file into the store.
    ///
    /// Failing feeds or files are logged and skipped; the rest still load.
    pub async fn refresh(&self) -> Result<()> {
        let window = self.store.read().await.window();
        let request = FetchRequest {
            sources: self.config.ical_sources.clone(),
            range_start: window.start,
            range_end: window.end,
        };

        let outcome = self.fetcher.fetch(&request).await;
        let normalizer = EventNormalizer::new(self.timezone);
        let feed_events = normalizer.normalize_feed_events(&outcome.response.events);

        let agenda = load_records(&self.config.agenda_paths()).await;
        let calendar = load_records(&self.config.calendar_module_paths()).await;

        let mut store = self.store.write().await;
        store.replace_source(EventSource::IcalFeed, feed_events);
        store.replace_source(
            EventSource::AgendaFeed,
            normalizer.normalize_records(&agenda, EventSource::AgendaFeed),
        );
        store.replace_source(
            EventSource::CalendarModule,
            normalizer.normalize_records(&calendar, EventSource::CalendarModule),
        );

        tracing::debug!(
            events = store.len(),
            failed_feeds = outcome.errors.len(),
            "store refreshed"
        );
        Ok(())
    }
}

/// The system zone, or UTC when it cannot be determined.
pub fn system_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(Tz::UTC)
}

/// Read JSON record arrays from each file, skipping unreadable ones.
async fn load_records(paths: &[PathBuf]) -> Vec<Value> {
    let mut records = Vec::new();

    for path in paths {
        match read_record_file(path).await {
            Ok(batch) => records.extend(batch),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping record file"),
        }
    }

    records
}

async fn read_record_file(path: &Path) -> Result<Vec<Value>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match serde_json::from_str(&contents)? {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("events") {
            Some(Value::Array(records)) => Ok(records),
            _ => anyhow::bail!("Expected a JSON array or an object with an \"events\" array"),
        },
        _ => anyhow::bail!("Expected a JSON array of event records"),
    }
}
