//! Defines the JSON contract between the core and a fetch collaborator.
//!
//! The core sends a [`FetchRequest`] naming the feeds and the range to expand;
//! the collaborator answers with one [`FetchResponse`] for everything that
//! succeeded and a [`FetchError`] per failing source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured recurring-feed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Sources without a URL are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Calendar label attached to every event from this feed.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub sources: Vec<SourceConfig>,
    pub range_start: DateTime<Utc>,
    pub range_end: DateTime<Utc>,
}

/// A feed item after expansion, as carried over the contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEvent {
    pub title: String,
    pub calendar_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub all_day: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    pub events: Vec<FeedEvent>,
}

/// Failure scoped to one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub message: String,
}

/// Messages emitted by the fetch service, in the order they are produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FetchMessage {
    Events(FetchResponse),
    Error(FetchError),
}
