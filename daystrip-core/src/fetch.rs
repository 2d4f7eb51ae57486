//! Concurrent feed fetching with per-source failure isolation.
//!
//! The transport is abstracted behind [`FeedFetcher`]; the service fetches
//! every source in parallel, expands each feed on its own and reports
//! failures per source without touching the others.

use std::future::Future;

use chrono_tz::Tz;
use futures::future::join_all;
use tokio::sync::mpsc;

use crate::error::{DayStripError, DayStripResult};
use crate::ics::read_feed;
use crate::protocol::{
    FeedEvent, FetchError, FetchMessage, FetchRequest, FetchResponse, SourceConfig,
};

/// Retrieves the raw text of a feed.
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = DayStripResult<String>> + Send;
}

/// Result of one batch: the union of every successful source plus one error
/// per failed source.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub response: FetchResponse,
    pub errors: Vec<FetchError>,
}

impl FetchOutcome {
    /// Messages in emission order: errors first, then the merged events.
    pub fn into_messages(self) -> Vec<FetchMessage> {
        self.errors
            .into_iter()
            .map(FetchMessage::Error)
            .chain(std::iter::once(FetchMessage::Events(self.response)))
            .collect()
    }
}

pub struct FetchService<F> {
    fetcher: F,
    timezone: Tz,
}

impl<F: FeedFetcher> FetchService<F> {
    /// `timezone` is used to read floating and date-only feed values.
    pub fn new(fetcher: F, timezone: Tz) -> Self {
        FetchService { fetcher, timezone }
    }

    /// Fetch and expand every source in the request.
    ///
    /// Items keep source order, so the first-wins duplicate passes stay
    /// deterministic for a given configuration.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let sources: Vec<(&SourceConfig, &str)> = request
            .sources
            .iter()
            .filter_map(|s| s.url.as_deref().map(|url| (s, url)))
            .collect();

        let results = join_all(
            sources
                .iter()
                .map(|(source, url)| self.fetch_source(source, url, request)),
        )
        .await;

        let mut outcome = FetchOutcome::default();
        for ((_, url), result) in sources.iter().zip(results) {
            match result {
                Ok(items) => outcome.response.events.extend(items),
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "feed fetch failed");
                    outcome.errors.push(FetchError {
                        url: Some(url.to_string()),
                        message: error_message(e),
                    });
                }
            }
        }

        tracing::debug!(
            sources = sources.len(),
            events = outcome.response.events.len(),
            failed = outcome.errors.len(),
            "fetch batch complete"
        );
        outcome
    }

    async fn fetch_source(
        &self,
        source: &SourceConfig,
        url: &str,
        request: &FetchRequest,
    ) -> DayStripResult<Vec<FeedEvent>> {
        let text = self.fetcher.fetch(url).await?;
        let items = read_feed(
            &text,
            source,
            request.range_start,
            request.range_end,
            self.timezone,
        )?;
        tracing::debug!(url = %url, events = items.len(), "parsed feed");
        Ok(items)
    }

    /// Serve requests from a channel until either side closes.
    ///
    /// Every request yields its error messages followed by one events message.
    pub async fn run(
        self,
        mut requests: mpsc::Receiver<FetchRequest>,
        replies: mpsc::Sender<FetchMessage>,
    ) {
        while let Some(request) = requests.recv().await {
            for message in self.fetch(&request).await.into_messages() {
                if replies.send(message).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn error_message(error: DayStripError) -> String {
    match error {
        DayStripError::Fetch { message, .. } => message,
        other => other.to_string(),
    }
}
