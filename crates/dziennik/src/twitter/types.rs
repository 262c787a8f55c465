//! Twitter API data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::act::TweetDraft;

/// A post as returned by the v2 API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Post ID.
    pub id: String,
    /// Post text.
    pub text: String,
    /// Author's user ID, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Creation time, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Tweet {
    /// Create a post with just an ID and text.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            author_id: None,
            created_at: None,
        }
    }
}

/// Envelope for v2 responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterResponse<T> {
    /// Payload; absent when a query matches nothing.
    pub data: Option<T>,
    /// Result metadata.
    #[serde(default)]
    pub meta: Option<ResponseMeta>,
}

/// Envelope for v2 responses that always carry data.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Pagination and count metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMeta {
    /// Number of results in this page.
    #[serde(default)]
    pub result_count: Option<u32>,
    /// ID of the newest result.
    #[serde(default)]
    pub newest_id: Option<String>,
    /// ID of the oldest result.
    #[serde(default)]
    pub oldest_id: Option<String>,
}

/// Body of `POST /2/tweets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateTweetRequest {
    /// Post text.
    pub text: String,
    /// Attached media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<CreateTweetMedia>,
    /// Post being replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<CreateTweetReply>,
}

/// Media attachment of a new post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTweetMedia {
    /// Uploaded media IDs.
    pub media_ids: Vec<String>,
}

/// Reply target of a new post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTweetReply {
    /// ID of the post being replied to.
    pub in_reply_to_tweet_id: String,
}

impl CreateTweetRequest {
    /// Plain text post.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Post for a composed draft, with its media when there is any.
    #[must_use]
    pub fn from_draft(draft: &TweetDraft) -> Self {
        let media = (!draft.media_ids.is_empty()).then(|| CreateTweetMedia {
            media_ids: draft.media_ids.clone(),
        });
        Self {
            text: draft.text(),
            media,
            reply: None,
        }
    }

    /// Make this post a reply to `tweet_id`.
    #[must_use]
    pub fn in_reply_to(mut self, tweet_id: impl Into<String>) -> Self {
        self.reply = Some(CreateTweetReply {
            in_reply_to_tweet_id: tweet_id.into(),
        });
        self
    }
}

/// A newly created post.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedTweet {
    /// Post ID.
    pub id: String,
    /// Post text as stored by the platform.
    pub text: String,
}

/// Body of `POST /2/users/{id}/likes`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LikeRequest<'a> {
    pub tweet_id: &'a str,
}

/// Result of a like.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LikeResult {
    pub liked: bool,
}

/// Response of the v1.1 media upload and status endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUploadResponse {
    /// Media ID as a string; the numeric form overflows JSON doubles.
    pub media_id_string: String,
    /// Present while the platform is still processing the upload.
    #[serde(default)]
    pub processing_info: Option<ProcessingInfo>,
}

/// Asynchronous processing state of an upload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingInfo {
    /// `pending`, `in_progress`, `succeeded` or `failed`.
    pub state: String,
    /// Suggested wait before the next status check.
    #[serde(default)]
    pub check_after_secs: Option<u64>,
    /// Failure details.
    #[serde(default)]
    pub error: Option<ProcessingError>,
}

impl ProcessingInfo {
    /// Processing finished successfully.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.state == "succeeded"
    }

    /// Processing failed for good.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == "failed"
    }
}

/// Processing failure details.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingError {
    /// Error name.
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_draft_without_media_omits_media() {
        let draft = TweetDraft {
            citation_line: "Dz.U. 2021 poz. 5".into(),
            title_line: "Ustawa".into(),
            url_line: "https://dziennikustaw.gov.pl/D2021000000501.pdf".into(),
            media_ids: Vec::new(),
        };

        let json = serde_json::to_value(CreateTweetRequest::from_draft(&draft)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "Dz.U. 2021 poz. 5\nUstawa\nhttps://dziennikustaw.gov.pl/D2021000000501.pdf"
            })
        );
    }

    #[test]
    fn test_reply_with_media() {
        let draft = TweetDraft {
            citation_line: "a".into(),
            title_line: "b".into(),
            url_line: "c".into(),
            media_ids: vec!["1".into(), "2".into()],
        };

        let json =
            serde_json::to_value(CreateTweetRequest::from_draft(&draft).in_reply_to("99")).unwrap();
        assert_eq!(json["media"]["media_ids"], serde_json::json!(["1", "2"]));
        assert_eq!(json["reply"]["in_reply_to_tweet_id"], "99");
    }

    #[test]
    fn test_empty_search_response() {
        let response: TwitterResponse<Vec<Tweet>> =
            serde_json::from_str(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.meta.unwrap().result_count, Some(0));
    }

    #[test]
    fn test_processing_states() {
        let upload: MediaUploadResponse = serde_json::from_str(
            r#"{"media_id":1,"media_id_string":"1","processing_info":{"state":"failed","error":{"name":"InvalidMedia","message":"Unsupported"}}}"#,
        )
        .unwrap();
        let info = upload.processing_info.unwrap();
        assert!(info.is_failed());
        assert!(!info.is_succeeded());
        assert_eq!(info.error.unwrap().name.as_deref(), Some("InvalidMedia"));
    }
}
