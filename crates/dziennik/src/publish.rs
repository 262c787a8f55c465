//! Publishing prepared posts and advancing the marker.

use std::sync::Arc;

use tracing::instrument;

use crate::discovery::{PendingPost, SummaryTask};
use crate::error::BotResult;
use crate::storage::MarkerStore;
use crate::summary::Summarize;
use crate::twitter::{CreateTweetRequest, SocialApi};

/// Result of publishing one batch.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    /// Posts confirmed by the platform.
    pub published: usize,
    /// Summary replies posted.
    pub summarized: usize,
    /// Replies posted to mentions.
    pub replied: usize,
    /// Non-fatal failures.
    pub errors: Vec<String>,
}

/// Posts drafts one at a time and records each in the marker.
pub struct Publisher {
    social: Arc<dyn SocialApi>,
    marker: MarkerStore,
    summarizer: Option<Arc<dyn Summarize>>,
    dry_run: bool,
}

impl Publisher {
    /// Create a new publisher.
    #[must_use]
    pub fn new(social: Arc<dyn SocialApi>, marker: MarkerStore, dry_run: bool) -> Self {
        Self {
            social,
            marker,
            summarizer: None,
            dry_run,
        }
    }

    /// Reply to each post with a summary of the act.
    #[must_use]
    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarize>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Publish a batch in order.
    ///
    /// The marker is written right after each confirmed post, so a failure
    /// mid-batch leaves it on the last post that went out. A failed post
    /// aborts the rest of the batch; a failed summary does not.
    #[instrument(skip_all, fields(batch = batch.len()))]
    pub async fn publish(&self, batch: Vec<PendingPost>) -> BotResult<PublishOutcome> {
        let mut outcome = PublishOutcome::default();

        if self.dry_run {
            for pending in &batch {
                tracing::warn!(text = %pending.draft.text(), "DRY RUN, not posting");
            }
            return Ok(outcome);
        }

        for pending in batch {
            let request = CreateTweetRequest::from_draft(&pending.draft);
            let created = self.social.post(&request).await?;
            tracing::info!(
                id = %created.id,
                citation = %pending.draft.citation_line,
                "Published"
            );

            self.marker.record(&pending.draft.citation_line)?;
            outcome.published += 1;

            if let Some(task) = pending.summary {
                match self.reply_with_summary(&created.id, &task).await {
                    Ok(true) => outcome.summarized += 1,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(reference = %task.reference, error = %e, "Summary skipped");
                        outcome.errors.push(format!("{}: summary failed: {e}", task.reference));
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Post replies to mentions. The marker is left alone.
    #[instrument(skip_all, fields(replies = replies.len()))]
    pub async fn publish_replies(&self, replies: Vec<CreateTweetRequest>) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();

        for reply in replies {
            let in_reply_to = reply
                .reply
                .as_ref()
                .map(|r| r.in_reply_to_tweet_id.clone())
                .unwrap_or_default();

            if self.dry_run {
                tracing::warn!(in_reply_to = %in_reply_to, text = %reply.text, "DRY RUN, not replying");
                continue;
            }

            match self.social.post(&reply).await {
                Ok(created) => {
                    tracing::info!(id = %created.id, in_reply_to = %in_reply_to, "Replied");
                    outcome.replied += 1;
                }
                Err(e) => {
                    tracing::warn!(in_reply_to = %in_reply_to, error = %e, "Reply failed");
                    outcome.errors.push(format!("reply to {in_reply_to}: {e}"));
                }
            }
        }

        outcome
    }

    async fn reply_with_summary(&self, post_id: &str, task: &SummaryTask) -> BotResult<bool> {
        let Some(summarizer) = &self.summarizer else {
            tracing::debug!(reference = %task.reference, "No summarizer configured");
            return Ok(false);
        };

        let summary = summarizer.summarize(&task.text).await?;
        let reply = CreateTweetRequest::text(summary).in_reply_to(post_id);
        let created = self.social.post(&reply).await?;
        tracing::info!(id = %created.id, reference = %task.reference, "Posted summary");
        Ok(true)
    }
}
