use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use daystrip_core::fetch::FetchService;
use daystrip_core::protocol::{FetchMessage, FetchRequest};
use daystrip_core::window::start_of_day;
use daystrip_core::{DayStripConfig, Window};
use tokio::sync::mpsc;

use super::system_timezone;
use crate::http::HttpFetcher;

/// Run one fetch request and print the contract messages.
///
/// The merged success response goes to stdout, each per-source failure to
/// stderr, one JSON document per line.
pub async fn run(config: DayStripConfig, from: Option<String>, to: Option<String>) -> Result<()> {
    let timezone = config.timezone(system_timezone())?;
    let window = Window::compute(Utc::now(), &config.window_settings(timezone));

    let range_start = match from {
        Some(value) => parse_instant(&value, timezone)?,
        None => window.start,
    };
    let range_end = match to {
        Some(value) => parse_instant(&value, timezone)?,
        None => window.end,
    };
    if range_end < range_start {
        anyhow::bail!("--to must not be before --from");
    }

    let service = FetchService::new(HttpFetcher::new()?, timezone);
    let (request_tx, request_rx) = mpsc::channel(1);
    let (reply_tx, mut reply_rx) = mpsc::channel(16);
    let worker = tokio::spawn(service.run(request_rx, reply_tx));

    request_tx
        .send(FetchRequest {
            sources: config.ical_sources,
            range_start,
            range_end,
        })
        .await
        .context("Fetch worker stopped unexpectedly")?;
    drop(request_tx);

    while let Some(message) = reply_rx.recv().await {
        match message {
            FetchMessage::Events(response) => println!("{}", serde_json::to_string(&response)?),
            FetchMessage::Error(error) => eprintln!("{}", serde_json::to_string(&error)?),
        }
    }

    worker.await.context("Fetch worker panicked")?;
    Ok(())
}

/// RFC 3339 instant, or a plain date meaning local midnight.
fn parse_instant(value: &str, timezone: Tz) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}': expected RFC 3339 or YYYY-MM-DD", value))?;
    Ok(start_of_day(timezone, date))
}
