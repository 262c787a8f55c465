//! Twitter/X API access.
//!
//! OAuth 1.0a signed client for posting, media upload, search and likes.

mod client;
mod config;
mod oauth;
mod types;

#[cfg(test)]
pub use client::MockSocialApi;
pub use client::{SocialApi, TwitterClient};
pub use config::{TwitterConfig, DEFAULT_HANDLE, DEFAULT_USER_ID};
pub use oauth::OAuthSigner;
pub use types::{
    CreateTweetMedia, CreateTweetReply, CreateTweetRequest, CreatedTweet, MediaUploadResponse,
    ProcessingInfo, Tweet, TwitterResponse,
};
