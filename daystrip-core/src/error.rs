//! Error types for daystrip.

use thiserror::Error;

/// Errors that can occur while ingesting or querying calendar events.
#[derive(Error, Debug)]
pub enum DayStripError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Invalid recurrence rule: {0}")]
    Recurrence(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DayStripError {
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        DayStripError::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for daystrip operations.
pub type DayStripResult<T> = Result<T, DayStripError>;
