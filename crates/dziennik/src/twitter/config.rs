//! Twitter client configuration.

use std::time::Duration;

use crate::error::TwitterError;
use crate::retry::RetryPolicy;

/// Account the bot posts as.
pub const DEFAULT_HANDLE: &str = "Dziennik_Ustaw";

/// Numeric ID of [`DEFAULT_HANDLE`].
pub const DEFAULT_USER_ID: &str = "1334198651141361666";

/// Configuration for the Twitter client.
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    /// OAuth 1.0a consumer key (API key).
    pub consumer_key: String,
    /// OAuth 1.0a consumer secret.
    pub consumer_secret: String,
    /// OAuth 1.0a access token.
    pub access_token: String,
    /// OAuth 1.0a access token secret.
    pub access_token_secret: String,
    /// Base URL of the v2 API.
    pub api_url: String,
    /// Base URL of the v1.1 media upload API.
    pub upload_url: String,
    /// Screen name of the bot account, without `@`.
    pub handle: String,
    /// Numeric user ID of the bot account.
    pub user_id: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Wait between media status checks.
    pub media_poll_interval: Duration,
    /// Status checks before an upload is considered stuck.
    pub media_max_polls: u32,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            api_url: "https://api.twitter.com".into(),
            upload_url: "https://upload.twitter.com".into(),
            handle: DEFAULT_HANDLE.into(),
            user_id: DEFAULT_USER_ID.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            media_poll_interval: Duration::from_millis(100),
            media_max_polls: 600,
        }
    }
}

impl TwitterConfig {
    /// Load credentials from the environment.
    ///
    /// Each credential is read from its camelCase name (`consumerKey`,
    /// `consumerSecret`, `accessToken`, `accessSecret`) or the upper snake
    /// case equivalent (`CONSUMER_KEY`, ...).
    pub fn from_env() -> Result<Self, TwitterError> {
        Ok(Self {
            consumer_key: credential("consumerKey", "CONSUMER_KEY")?,
            consumer_secret: credential("consumerSecret", "CONSUMER_SECRET")?,
            access_token: credential("accessToken", "ACCESS_TOKEN")?,
            access_token_secret: credential("accessSecret", "ACCESS_SECRET")?,
            ..Default::default()
        })
    }

    /// Override the account handle and user ID.
    #[must_use]
    pub fn with_account(mut self, handle: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.handle = handle.into();
        self.user_id = user_id.into();
        self
    }
}

fn credential(name: &str, upper: &str) -> Result<String, TwitterError> {
    std::env::var(name)
        .or_else(|_| std::env::var(upper))
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| TwitterError::Config(format!("{name} (or {upper}) is not set")))
}
