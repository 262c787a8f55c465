//! AI summaries of act text, posted as replies to the act's post.

mod anthropic;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use crate::act::ELLIPSIS;
use crate::error::SummaryError;

pub use anthropic::{AnthropicSummarizer, SummaryConfig, DEFAULT_SUMMARY_MODEL};

/// Platform post length limit.
pub const MAX_POST_LENGTH: usize = 280;

/// Produces a short plain-language summary of an act.
#[async_trait]
pub trait Summarize: Send + Sync {
    /// Summarize the act's full text into post-sized text.
    async fn summarize(&self, text: &str) -> Result<String, SummaryError>;
}

/// Cut `text` to at most `max` user-perceived characters, ending with `…`
/// when anything was removed.
#[must_use]
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    if text.graphemes(true).count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text
        .graphemes(true)
        .take(max.saturating_sub(1))
        .collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push(ELLIPSIS);
    truncated
}
