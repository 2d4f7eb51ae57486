use anyhow::Result;
use daystrip_core::DayStripConfig;

use super::Session;
use crate::render::{Render, RenderContext};
use crate::utils::tui::create_spinner;

pub async fn run(
    mut config: DayStripConfig,
    days: Option<u32>,
    offset: Option<i64>,
    json: bool,
) -> Result<()> {
    if let Some(days) = days {
        config.days_to_show = days;
    }
    if let Some(offset) = offset {
        config.start_day_offset = offset;
    }

    let session = Session::new(config)?;

    let spinner = create_spinner("Fetching calendars...");
    session.refresh().await?;
    spinner.finish_and_clear();

    let store = session.store.read().await;
    let days = store.days(&session.config.hidden_calendars());

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    let ctx = RenderContext {
        timezone: session.timezone,
        today: chrono::Utc::now().with_timezone(&session.timezone).date_naive(),
        max_events_per_day: session.config.max_events_per_day,
    };
    println!("{}", days.render(&ctx));

    Ok(())
}
