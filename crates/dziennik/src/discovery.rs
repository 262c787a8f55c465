//! Act discovery: sequential probing of gazette positions.
//!
//! Positions within a year have no gaps, so the first position without a
//! title ends the scan for this run.

use std::sync::Arc;

use tracing::instrument;

use crate::act::{ActReference, GazetteAct, PostComposer, TweetDraft};
use crate::error::BotResult;
use crate::gazette::{ActSource, PageRenderer};
use crate::storage::Cursor;
use crate::twitter::SocialApi;

/// Default number of acts prepared per run.
pub const DEFAULT_BATCH_CAP: usize = 3;

/// Documents longer than this are posted without page images.
pub const DEFAULT_MAX_PAGES: usize = 4;

/// Configuration for discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum drafts per run; `None` scans until the first miss.
    pub batch_cap: Option<usize>,
    /// Page count above which media is skipped.
    pub max_pages: usize,
    /// Extract the act text for a summary reply.
    pub extract_text: bool,
    /// Render but never upload.
    pub dry_run: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_cap: Some(DEFAULT_BATCH_CAP),
            max_pages: DEFAULT_MAX_PAGES,
            extract_text: false,
            dry_run: false,
        }
    }
}

/// Text to summarize once the act's post is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTask {
    /// Act the text belongs to.
    pub reference: ActReference,
    /// Full extracted text.
    pub text: String,
}

/// A prepared post waiting to be published.
#[derive(Debug, Clone)]
pub struct PendingPost {
    /// Act being announced.
    pub reference: ActReference,
    /// Composed post with uploaded media.
    pub draft: TweetDraft,
    /// Summary to reply with after publishing, if any.
    pub summary: Option<SummaryTask>,
}

/// Finds newly published acts and prepares their posts.
pub struct Discovery {
    source: Arc<dyn ActSource>,
    renderer: Arc<dyn PageRenderer>,
    social: Arc<dyn SocialApi>,
    composer: PostComposer,
    config: DiscoveryConfig,
}

impl Discovery {
    /// Create a new discovery loop.
    #[must_use]
    pub fn new(
        source: Arc<dyn ActSource>,
        renderer: Arc<dyn PageRenderer>,
        social: Arc<dyn SocialApi>,
        composer: PostComposer,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            source,
            renderer,
            social,
            composer,
            config,
        }
    }

    /// Composer used for drafts.
    #[must_use]
    pub fn composer(&self) -> &PostComposer {
        &self.composer
    }

    /// Probe positions after `cursor` until a miss or the batch cap.
    ///
    /// Drafts come back in increasing position order. Fetch, render and
    /// upload failures abort the whole batch.
    #[instrument(skip(self), fields(year = cursor.year, after = cursor.position))]
    pub async fn discover(&self, cursor: Cursor) -> BotResult<Vec<PendingPost>> {
        let cap = self.config.batch_cap.filter(|cap| *cap > 0);
        let mut batch = Vec::new();
        let mut position = cursor.position;

        loop {
            if let Some(cap) = cap.filter(|cap| batch.len() >= *cap) {
                tracing::info!(cap, "Batch cap reached");
                break;
            }

            position += 1;
            let reference = ActReference::new(cursor.year, 0, position);

            match self.prepare(reference).await? {
                Some(pending) => {
                    tracing::info!(text = %pending.draft.text(), "Prepared");
                    batch.push(pending);
                }
                None => {
                    tracing::info!(year = cursor.year, position, "No data");
                    break;
                }
            }
        }

        Ok(batch)
    }

    /// Fetch, render and compose one act; `None` when it is not published.
    #[instrument(skip(self), fields(year = reference.year, position = reference.position))]
    pub async fn prepare(&self, reference: ActReference) -> BotResult<Option<PendingPost>> {
        let Some(title) = self.source.title(reference).await? else {
            return Ok(None);
        };

        let pdf = self.source.pdf(reference).await?;
        let page_count = self.renderer.page_count(&pdf).await?;
        tracing::debug!(pages = page_count, "Fetched act PDF");

        let act = GazetteAct {
            reference,
            title,
            pdf,
            page_count,
        };

        let media_ids = self.upload_pages(&act).await?;
        let summary = if self.config.extract_text {
            self.summary_task(&act).await
        } else {
            None
        };

        let draft = self.composer.compose(reference, &act.title).with_media(media_ids);
        Ok(Some(PendingPost {
            reference,
            draft,
            summary,
        }))
    }

    async fn upload_pages(&self, act: &GazetteAct) -> BotResult<Vec<String>> {
        if act.page_count > self.config.max_pages {
            tracing::info!(
                pages = act.page_count,
                max_pages = self.config.max_pages,
                "Too many pages, posting without images"
            );
            return Ok(Vec::new());
        }

        let pages = self.renderer.render_pages(&act.pdf).await?;
        tracing::info!(pages = pages.len(), "Pages to upload");

        if self.config.dry_run {
            return Ok(Vec::new());
        }

        let mut media_ids = Vec::with_capacity(pages.len());
        for page in pages {
            let media_id = self.social.upload_image(page).await?;
            tracing::debug!(media_id = %media_id, "Uploaded page");
            media_ids.push(media_id);
        }
        Ok(media_ids)
    }

    async fn summary_task(&self, act: &GazetteAct) -> Option<SummaryTask> {
        match self.renderer.extract_text(&act.pdf).await {
            Ok(text) if !text.trim().is_empty() => Some(SummaryTask {
                reference: act.reference,
                text,
            }),
            Ok(_) => {
                tracing::warn!("Act has no extractable text, no summary");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Text extraction failed, no summary");
                None
            }
        }
    }
}
