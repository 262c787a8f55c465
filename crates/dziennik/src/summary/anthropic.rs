//! Anthropic Messages API summarizer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{truncate_graphemes, Summarize, MAX_POST_LENGTH};
use crate::error::SummaryError;
use crate::retry::RetryPolicy;

/// Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model
pub const DEFAULT_SUMMARY_MODEL: &str = "claude-3-5-haiku-20241022";

const SYSTEM_PROMPT: &str = "Jesteś redaktorem konta publikującego nowe akty prawne z Dziennika Ustaw. \
Streść podany akt prawny po polsku, prostym językiem, w jednym lub dwóch zdaniach \
i nie więcej niż 250 znakach. Napisz tylko streszczenie, bez wstępu i bez hashtagów.";

/// Configuration for [`AnthropicSummarizer`].
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// API key.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Messages endpoint.
    pub base_url: String,
    /// Longest act text sent to the model, in characters.
    pub max_input_chars: usize,
    /// Output token budget.
    pub max_tokens: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl SummaryConfig {
    /// Configuration with defaults for everything but the key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_SUMMARY_MODEL.to_string(),
            base_url: ANTHROPIC_API_URL.to_string(),
            max_input_chars: 400_000,
            max_tokens: 300,
            timeout: Duration::from_secs(120),
            retry: RetryPolicy::summary(),
        }
    }

    /// Configuration from `ANTHROPIC_API_KEY`, `None` when it is not set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }

    /// Use another model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Summarizes acts with Claude.
#[derive(Debug, Clone)]
pub struct AnthropicSummarizer {
    client: Client,
    config: SummaryConfig,
}

impl AnthropicSummarizer {
    /// Create a summarizer from configuration.
    pub fn new(config: SummaryConfig) -> Result<Self, SummaryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn request(&self, body: &MessagesRequest<'_>, chars: usize) -> Result<String, SummaryError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (error_type, message) = match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(parsed) => (parsed.error.error_type, parsed.error.message),
                Err(_) => (String::new(), text),
            };

            if status.as_u16() == 400 && is_too_long(&error_type, &message) {
                return Err(SummaryError::InputTooLarge { chars });
            }
            return Err(SummaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(SummaryError::Empty);
        }
        Ok(text)
    }
}

fn is_too_long(error_type: &str, message: &str) -> bool {
    let message = message.to_lowercase();
    (error_type.is_empty() || error_type == "invalid_request_error")
        && (message.contains("too long") || message.contains("maximum context length"))
}

#[async_trait]
impl Summarize for AnthropicSummarizer {
    #[instrument(skip(self, text), fields(chars = tracing::field::Empty))]
    async fn summarize(&self, text: &str) -> Result<String, SummaryError> {
        let chars = text.chars().count();
        tracing::Span::current().record("chars", chars);

        if chars > self.config.max_input_chars {
            return Err(SummaryError::InputTooLarge { chars });
        }

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: [Message {
                role: "user",
                content: text,
            }],
        };

        let summary = self
            .config
            .retry
            .run("summarize act", || self.request(&body, chars))
            .await?;

        Ok(truncate_graphemes(summary.trim(), MAX_POST_LENGTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn test_summarizer(server: &MockServer, max_attempts: u32) -> AnthropicSummarizer {
        let mut config = SummaryConfig::new("test-key");
        config.base_url = format!("{}/v1/messages", server.uri());
        config.max_input_chars = 1_000;
        config.retry = RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        AnthropicSummarizer::new(config).unwrap()
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": DEFAULT_SUMMARY_MODEL,
            "content": [{ "type": "text", "text": text }],
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        }))
    }

    #[tokio::test]
    async fn test_summarize_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(text_response("  Rozporządzenie zmienia stawki opłat.  "))
            .expect(1)
            .mount(&server)
            .await;

        let summary = test_summarizer(&server, 3)
            .summarize("Treść aktu")
            .await
            .unwrap();
        assert_eq!(summary, "Rozporządzenie zmienia stawki opłat.");
    }

    #[tokio::test]
    async fn test_oversized_input_never_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(text_response("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let result = test_summarizer(&server, 3).summarize(&"a".repeat(1_001)).await;
        assert!(matches!(result, Err(SummaryError::InputTooLarge { chars: 1_001 })));
    }

    #[tokio::test]
    async fn test_prompt_too_long_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "type": "error",
                "error": {
                    "type": "invalid_request_error",
                    "message": "prompt is too long: 250000 tokens > 200000 maximum"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = test_summarizer(&server, 3).summarize("Treść").await;
        assert!(matches!(result, Err(SummaryError::InputTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_overloaded_retried_until_budget_spent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .expect(3)
            .mount(&server)
            .await;

        let result = test_summarizer(&server, 3).summarize("Treść").await;
        assert!(matches!(result, Err(SummaryError::Api { status: 529, .. })));
    }

    #[test]
    fn test_is_too_long() {
        assert!(is_too_long("invalid_request_error", "prompt is too long"));
        assert!(!is_too_long("invalid_request_error", "max_tokens must be positive"));
        assert!(!is_too_long("overloaded_error", "too long queue"));
    }
}
