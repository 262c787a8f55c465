//! Dziennik Ustaw bot: announces new acts of the Polish Journal of Laws.
//!
//! This crate provides:
//! - Citation parsing and post composition for acts
//! - Sequential discovery of newly published acts
//! - PDF page rendering and media upload
//! - Replies to mentions citing acts and keyword likes
//! - AI summaries posted as replies

pub mod act;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gazette;
pub mod liker;
pub mod pipeline;
pub mod publish;
pub mod responder;
pub mod retry;
pub mod storage;
pub mod summary;
pub mod twitter;

// Re-export main types
pub use act::{parse_citation, ActReference, PostComposer, Tables, TweetDraft};
pub use config::BotConfig;
pub use discovery::{Discovery, DiscoveryConfig, PendingPost};
pub use error::{BotError, BotResult};
pub use pipeline::{Bot, RunOptions, RunReport};
pub use publish::Publisher;
pub use storage::{Cursor, MarkerStore};
