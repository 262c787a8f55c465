//! Twitter REST API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use super::config::TwitterConfig;
use super::oauth::{percent_encode, OAuthSigner};
use super::types::{
    CreateTweetRequest, CreatedTweet, DataEnvelope, LikeRequest, LikeResult, MediaUploadResponse,
    Tweet, TwitterResponse,
};
use crate::error::TwitterError;
use crate::gazette::PAGE_MEDIA_TYPE;

const MEDIA_UPLOAD_ENDPOINT: &str = "/1.1/media/upload.json";

/// The social platform operations the bot needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Upload one page image and wait until it is usable; returns its media ID.
    async fn upload_image(&self, image: Vec<u8>) -> Result<String, TwitterError>;

    /// Publish a post.
    async fn post(&self, request: &CreateTweetRequest) -> Result<CreatedTweet, TwitterError>;

    /// Recent posts matching `query`, newest first, optionally only newer than `since_id`.
    async fn search(&self, query: &str, since_id: Option<String>)
        -> Result<Vec<Tweet>, TwitterError>;

    /// The account's newest own post, excluding replies and reposts.
    async fn latest_own_post(&self) -> Result<Option<Tweet>, TwitterError>;

    /// The newest post the account liked.
    async fn latest_like(&self) -> Result<Option<Tweet>, TwitterError>;

    /// Like a post as the account.
    async fn like(&self, tweet_id: &str) -> Result<(), TwitterError>;
}

/// Twitter client signing every request with OAuth 1.0a.
#[derive(Debug)]
pub struct TwitterClient {
    client: Client,
    signer: OAuthSigner,
    config: TwitterConfig,
}

impl TwitterClient {
    /// Create a new client from configuration.
    pub fn new(config: TwitterConfig) -> Result<Self, TwitterError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("dziennik/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            signer: OAuthSigner::new(&config),
            config,
        })
    }

    /// Screen name of the account, without `@`.
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.config.handle
    }

    /// Signed GET against `base` + `endpoint`, retried per policy.
    async fn get<T: DeserializeOwned>(
        &self,
        base: &str,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T, TwitterError> {
        let url = format!("{}{}", base.trim_end_matches('/'), endpoint);
        let url = url.as_str();

        self.config
            .retry
            .run(endpoint, || self.send_get(url, params))
            .await
    }

    /// Signed JSON POST against the v2 API, retried per policy.
    async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, TwitterError> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), endpoint);
        let url = url.as_str();

        self.config
            .retry
            .run(endpoint, || self.send_json(url, body))
            .await
    }

    /// POST a request that creates something. It is sent again only when
    /// the previous attempt certainly never reached the API.
    async fn create_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, TwitterError> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), endpoint);
        let url = url.as_str();

        self.config
            .retry
            .run_when(endpoint, TwitterError::is_safe_to_resend, || {
                self.send_json(url, body)
            })
            .await
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<T, TwitterError> {
        debug!(url, "GET");
        let auth = self.signer.sign("GET", url, params)?;
        let response = self
            .client
            .get(with_query(url, params))
            .header(AUTHORIZATION, auth)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, TwitterError> {
        debug!(url, "POST");
        let auth = self.signer.sign("POST", url, &[])?;
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, auth)
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn send_media(&self, url: &str, image: &[u8]) -> Result<MediaUploadResponse, TwitterError> {
        let auth = self.signer.sign("POST", url, &[])?;
        let part = Part::bytes(image.to_vec())
            .file_name("page.png")
            .mime_str(PAGE_MEDIA_TYPE)?;
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, auth)
            .multipart(Form::new().part("media", part))
            .send()
            .await?;
        handle_response(response).await
    }

    /// Poll the upload status at a fixed interval until processing ends.
    async fn await_processing(&self, mut upload: MediaUploadResponse) -> Result<String, TwitterError> {
        let media_id = upload.media_id_string.clone();
        let mut polls = 0;

        while let Some(info) = upload.processing_info.take() {
            if info.is_succeeded() {
                break;
            }
            if info.is_failed() {
                let reason = info
                    .error
                    .and_then(|e| e.message.or(e.name))
                    .unwrap_or_else(|| "processing failed".to_string());
                return Err(TwitterError::MediaProcessing { media_id, reason });
            }
            if polls >= self.config.media_max_polls {
                return Err(TwitterError::MediaProcessing {
                    media_id,
                    reason: format!("still {} after {polls} status checks", info.state),
                });
            }

            polls += 1;
            debug!(media_id = %media_id, state = %info.state, polls, "Still processing");
            tokio::time::sleep(self.config.media_poll_interval).await;

            upload = self
                .get(
                    &self.config.upload_url,
                    MEDIA_UPLOAD_ENDPOINT,
                    &params(&[("command", "STATUS"), ("media_id", media_id.as_str())]),
                )
                .await?;
        }

        debug!(media_id = %media_id, "Upload successful");
        Ok(media_id)
    }
}

#[async_trait]
impl SocialApi for TwitterClient {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn upload_image(&self, image: Vec<u8>) -> Result<String, TwitterError> {
        let url = format!(
            "{}{}",
            self.config.upload_url.trim_end_matches('/'),
            MEDIA_UPLOAD_ENDPOINT
        );
        let url = url.as_str();
        let image = image.as_slice();

        let upload = self
            .config
            .retry
            .run("media upload", || self.send_media(url, image))
            .await?;
        self.await_processing(upload).await
    }

    #[instrument(skip(self, request))]
    async fn post(&self, request: &CreateTweetRequest) -> Result<CreatedTweet, TwitterError> {
        let created: DataEnvelope<CreatedTweet> = self.create_json("/2/tweets", request).await?;
        Ok(created.data)
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        since_id: Option<String>,
    ) -> Result<Vec<Tweet>, TwitterError> {
        let mut query_params = params(&[
            ("query", query),
            ("max_results", "10"),
            ("sort_order", "recency"),
            ("tweet.fields", "author_id,created_at"),
        ]);
        if let Some(since_id) = since_id {
            query_params.push(("since_id".to_string(), since_id));
        }

        let response: TwitterResponse<Vec<Tweet>> = self
            .get(&self.config.api_url, "/2/tweets/search/recent", &query_params)
            .await?;
        Ok(response.data.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn latest_own_post(&self) -> Result<Option<Tweet>, TwitterError> {
        let endpoint = format!("/2/users/{}/tweets", self.config.user_id);
        let response: TwitterResponse<Vec<Tweet>> = self
            .get(
                &self.config.api_url,
                &endpoint,
                &params(&[
                    ("exclude", "retweets,replies"),
                    ("max_results", "5"),
                    ("tweet.fields", "created_at"),
                ]),
            )
            .await?;
        Ok(response.data.unwrap_or_default().into_iter().next())
    }

    #[instrument(skip(self))]
    async fn latest_like(&self) -> Result<Option<Tweet>, TwitterError> {
        let endpoint = format!("/2/users/{}/liked_tweets", self.config.user_id);
        let response: TwitterResponse<Vec<Tweet>> = self
            .get(
                &self.config.api_url,
                &endpoint,
                &params(&[("max_results", "10"), ("tweet.fields", "created_at")]),
            )
            .await?;
        Ok(response.data.unwrap_or_default().into_iter().next())
    }

    #[instrument(skip(self))]
    async fn like(&self, tweet_id: &str) -> Result<(), TwitterError> {
        let endpoint = format!("/2/users/{}/likes", self.config.user_id);
        let result: DataEnvelope<LikeResult> =
            self.post_json(&endpoint, &LikeRequest { tweet_id }).await?;
        if !result.data.liked {
            warn!(tweet_id, "Like was not applied");
        }
        Ok(())
    }
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Append RFC 3986 encoded query parameters, matching what gets signed.
fn with_query(url: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{url}?{query}")
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, TwitterError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = seconds_until_reset(response.headers()).unwrap_or(60);
        return Err(TwitterError::RateLimited { retry_after });
    }

    let bytes = response.bytes().await?;
    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(TwitterError::from);
    }

    Err(TwitterError::Api {
        status: status.as_u16(),
        message: error_message(&bytes),
    })
}

fn seconds_until_reset(headers: &HeaderMap) -> Option<u64> {
    let reset: u64 = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs();
    reset.checked_sub(now)
}

fn error_message(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        detail: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        errors: Vec<ErrorItem>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorItem {
        #[serde(default)]
        message: Option<String>,
    }

    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed
            .detail
            .or(parsed.title)
            .or_else(|| parsed.errors.into_iter().find_map(|e| e.message))
            .unwrap_or_else(|| "Unknown error".to_string()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}
