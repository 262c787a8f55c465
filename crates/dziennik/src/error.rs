//! Error types for the bot.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::retry::Retryable;

/// Errors talking to the gazette site or rendering its PDFs.
#[derive(Debug, Error)]
pub enum GazetteError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected response status
    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// PDF rendering or text extraction failed
    #[error("PDF rendering failed: {0}")]
    Render(String),

    /// Scratch file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Retryable for GazetteError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Render(_) | Self::Io(_) => false,
        }
    }
}

/// Errors from the Twitter API.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OAuth signature generation failed
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Twitter API returned an error
    #[error("Twitter API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Rate limited
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Uploaded media could not be processed
    #[error("Media {media_id} processing failed: {reason}")]
    MediaProcessing { media_id: String, reason: String },

    /// Missing credentials or settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TwitterError {
    /// Whether the request certainly never took effect, so sending it again
    /// cannot duplicate a post. Timeouts and 5xx responses do not qualify.
    #[must_use]
    pub fn is_safe_to_resend(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect(),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }
}

impl Retryable for TwitterError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(Duration::from_secs(*retry_after)),
            _ => None,
        }
    }
}

/// Errors while summarizing an act.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error
    #[error("Summary API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Input exceeds what the model accepts; never retried
    #[error("Act text too large to summarize ({chars} characters)")]
    InputTooLarge { chars: usize },

    /// The API answered without any text
    #[error("Summary API returned no text")]
    Empty,
}

impl Retryable for SummaryError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Empty => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            Self::InputTooLarge { .. } => false,
        }
    }
}

/// Errors reading or writing the last-posted marker.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// Marker file could not be read or written
    #[error("Marker file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Marker does not hold a parseable citation line
    #[error("Marker {path} is unusable (read {content:?}); refusing to guess where to resume")]
    Unavailable { path: PathBuf, content: String },
}

/// Run-level errors.
#[derive(Debug, Error)]
pub enum BotError {
    /// Gazette failure
    #[error(transparent)]
    Gazette(#[from] GazetteError),

    /// Twitter failure
    #[error(transparent)]
    Twitter(#[from] TwitterError),

    /// Summary failure
    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// Marker failure
    #[error(transparent)]
    Marker(#[from] MarkerError),
}

/// Result type for run-level operations.
pub type BotResult<T> = Result<T, BotError>;
