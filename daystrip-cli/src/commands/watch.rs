use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use daystrip_core::DayStripConfig;
use owo_colors::OwoColorize;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use super::Session;
use crate::render::{Render, RenderContext};

/// Redraw the strip on every refetch until interrupted.
pub async fn run(config: DayStripConfig) -> Result<()> {
    let period = config.update_interval()?;
    let session = Arc::new(Session::new(config)?);

    tracing::info!(every = %humantime::format_duration(period), "watching calendars");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut refresh = LatestTask::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let session = Arc::clone(&session);
                refresh.replace(async move {
                    match session.refresh().await {
                        Ok(()) => {
                            redraw(&session).await;
                            tracing::info!("refresh complete");
                        }
                        Err(e) => tracing::error!(error = %e, "refresh failed"),
                    }
                });
            }
            _ = &mut shutdown => {
                refresh.cancel();
                println!();
                println!("{}", "Stopped watching.".dimmed());
                return Ok(());
            }
        }
    }
}

/// At most one refresh in flight; starting a new one aborts the previous.
///
/// A refresh that is still fetching when the next tick fires would otherwise
/// merge older data over the newer tick's result.
#[derive(Default)]
struct LatestTask {
    current: Option<JoinHandle<()>>,
}

impl LatestTask {
    fn replace(&mut self, task: impl Future<Output = ()> + Send + 'static) {
        self.cancel();
        self.current = Some(tokio::spawn(task));
    }

    fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            if !previous.is_finished() {
                tracing::warn!("previous refresh still running, cancelling it");
            }
            previous.abort();
        }
    }
}

async fn redraw(session: &Session) {
    let store = session.store.read().await;
    let days = store.days(&session.config.hidden_calendars());

    let ctx = RenderContext {
        timezone: session.timezone,
        today: chrono::Utc::now().with_timezone(&session.timezone).date_naive(),
        max_events_per_day: session.config.max_events_per_day,
    };

    // Clear screen and home the cursor
    print!("\x1b[2J\x1b[H");
    println!("{}", days.render(&ctx));
}
