//! HTTP transport for ICS feeds.

use std::time::Duration;

use anyhow::{Context, Result};
use daystrip_core::constants::USER_AGENT;
use daystrip_core::fetch::FeedFetcher;
use daystrip_core::{DayStripError, DayStripResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }
}

impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> DayStripResult<String> {
        let target = webcal_to_https(url);

        let resp = self
            .http
            .get(&target)
            .send()
            .await
            .map_err(|e| DayStripError::fetch(url, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DayStripError::fetch(url, format!("HTTP {}", status.as_u16())));
        }

        resp.text()
            .await
            .map_err(|e| DayStripError::fetch(url, e.to_string()))
    }
}

/// Subscription links are often shared as `webcal://`, which is plain HTTPS.
fn webcal_to_https(url: &str) -> String {
    match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}
