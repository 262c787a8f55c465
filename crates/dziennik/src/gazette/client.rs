//! Gazette site HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::instrument;

use crate::act::{pdf_url, ActReference, DEFAULT_BASE_URL};
use crate::error::GazetteError;
use crate::retry::RetryPolicy;

use super::page::extract_title;

/// The site serves some clients a stripped page; a browser agent gets the full one.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Android 4.4; Tablet; rv:41.0) Gecko/41.0 Firefox/41.0";

/// Source of act titles and documents.
#[async_trait]
pub trait ActSource: Send + Sync {
    /// Title of the act, or `None` when it is not published (yet).
    async fn title(&self, reference: ActReference) -> Result<Option<String>, GazetteError>;

    /// The act's PDF document.
    async fn pdf(&self, reference: ActReference) -> Result<Vec<u8>, GazetteError>;
}

/// Configuration for the gazette client.
#[derive(Debug, Clone)]
pub struct GazetteConfig {
    /// Site root, without a trailing slash.
    pub base_url: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Skip TLS certificate verification for the gazette site only.
    ///
    /// The site has served incomplete certificate chains before; this is
    /// scoped to this client and off unless explicitly enabled.
    pub accept_invalid_certs: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl Default for GazetteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::gazette(),
        }
    }
}

/// HTTP client for act pages and PDFs.
#[derive(Debug, Clone)]
pub struct GazetteClient {
    client: Client,
    config: GazetteConfig,
}

impl GazetteClient {
    /// Create a client from configuration.
    pub fn new(config: GazetteConfig) -> Result<Self, GazetteError> {
        if config.accept_invalid_certs {
            tracing::warn!(base_url = %config.base_url, "TLS certificate verification disabled for gazette requests");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { client, config })
    }

    /// Whether certificate verification is disabled for this client.
    #[must_use]
    pub fn accepts_invalid_certs(&self) -> bool {
        self.config.accept_invalid_certs
    }

    /// URL of the act's HTML page.
    #[must_use]
    pub fn page_url(&self, reference: ActReference) -> String {
        format!(
            "{}/DU/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            reference.year,
            reference.position
        )
    }

    /// URL of the act's PDF.
    #[must_use]
    pub fn pdf_url(&self, reference: ActReference) -> String {
        pdf_url(&self.config.base_url, reference)
    }

    /// Fetch and parse the act's title.
    ///
    /// Client errors (404 and friends) and pages without a heading mean the
    /// act does not exist yet. Server errors and transport failures are
    /// retried, then returned.
    #[instrument(skip(self), fields(year = reference.year, position = reference.position))]
    pub async fn fetch_title(&self, reference: ActReference) -> Result<Option<String>, GazetteError> {
        let url = self.page_url(reference);
        let url = url.as_str();

        let page = self
            .config
            .retry
            .run("fetch act page", || self.get_page(url))
            .await?;

        Ok(page.as_deref().and_then(extract_title))
    }

    /// Fetch the act's PDF. Any non-200 status is an error.
    #[instrument(skip(self), fields(year = reference.year, position = reference.position))]
    pub async fn fetch_pdf(&self, reference: ActReference) -> Result<Vec<u8>, GazetteError> {
        let url = self.pdf_url(reference);
        let url = url.as_str();

        tracing::info!(url, "GET act PDF");
        self.config
            .retry
            .run("fetch act PDF", || self.get_bytes(url))
            .await
    }

    async fn get_page(&self, url: &str) -> Result<Option<String>, GazetteError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(Some(response.text().await?));
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            tracing::debug!(url, status = status.as_u16(), body = %body, "Act page request failed");
            return Err(GazetteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        tracing::debug!(url, status = status.as_u16(), "Act page not available");
        Ok(None)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, GazetteError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(url, status = status.as_u16(), body = %body, "Act PDF request failed");
            return Err(GazetteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ActSource for GazetteClient {
    async fn title(&self, reference: ActReference) -> Result<Option<String>, GazetteError> {
        self.fetch_title(reference).await
    }

    async fn pdf(&self, reference: ActReference) -> Result<Vec<u8>, GazetteError> {
        self.fetch_pdf(reference).await
    }
}
