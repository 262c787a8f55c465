//! Bot run - orchestrates the full like-respond-discover-publish flow.

use std::sync::Arc;

use crate::act::Tables;
use crate::config::BotConfig;
use crate::discovery::Discovery;
use crate::error::BotResult;
use crate::gazette::{ActSource, PageRenderer};
use crate::liker::Liker;
use crate::publish::Publisher;
use crate::responder::Responder;
use crate::storage::MarkerStore;
use crate::summary::Summarize;
use crate::twitter::SocialApi;

/// Which stages a run performs.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Like recent posts mentioning the gazette.
    pub like: bool,
    /// Reply to mentions citing acts.
    pub respond: bool,
    /// Discover and publish new acts.
    pub discover: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            like: false,
            respond: false,
            discover: true,
        }
    }
}

/// Result of a single run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Acts found and prepared.
    pub discovered: usize,
    /// Acts posted.
    pub published: usize,
    /// Mentions answered.
    pub replied: usize,
    /// Posts liked.
    pub liked: usize,
    /// Summary replies posted.
    pub summarized: usize,
    /// Errors that did not stop the run.
    pub errors: Vec<String>,
}

/// Bot orchestrator.
pub struct Bot {
    marker: MarkerStore,
    discovery: Arc<Discovery>,
    publisher: Publisher,
    responder: Responder,
    liker: Liker,
}

impl Bot {
    /// Wire the bot's stages around the given collaborators.
    #[must_use]
    pub fn new(
        config: &BotConfig,
        tables: Tables,
        source: Arc<dyn ActSource>,
        renderer: Arc<dyn PageRenderer>,
        social: Arc<dyn SocialApi>,
        summarizer: Option<Arc<dyn Summarize>>,
    ) -> Self {
        let marker = MarkerStore::new(config.marker_path.clone(), tables.clone());
        let discovery = Arc::new(Discovery::new(
            source,
            renderer,
            social.clone(),
            config.composer(tables),
            config.discovery_config(),
        ));

        let mut publisher = Publisher::new(social.clone(), marker.clone(), config.dry_run);
        if let Some(summarizer) = summarizer {
            publisher = publisher.with_summarizer(summarizer);
        }

        Self {
            marker,
            discovery: discovery.clone(),
            publisher,
            responder: Responder::new(social.clone(), discovery, config.handle.clone()),
            liker: Liker::new(social, config.handle.clone(), config.dry_run),
        }
    }

    /// Run the selected stages once.
    ///
    /// Liking and responding failures are collected in the report. A bad
    /// marker or a failed discovery or post ends the run with an error.
    pub async fn run(&self, options: RunOptions, current_year: u32) -> BotResult<RunReport> {
        let mut report = RunReport::default();

        tracing::info!(
            like = options.like,
            respond = options.respond,
            discover = options.discover,
            current_year,
            "Starting run"
        );

        if options.like {
            match self.liker.like_recent().await {
                Ok(outcome) => {
                    report.liked = outcome.liked;
                    report.errors.extend(outcome.errors);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Liking failed");
                    report.errors.push(format!("like: {e}"));
                }
            }
        }

        if options.respond {
            match self.responder.prepare_replies(current_year).await {
                Ok(replies) => {
                    let outcome = self.publisher.publish_replies(replies).await;
                    report.replied = outcome.replied;
                    report.errors.extend(outcome.errors);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Responding failed");
                    report.errors.push(format!("respond: {e}"));
                }
            }
        }

        if options.discover {
            let cursor = self.marker.resume_point(current_year)?;
            let batch = self.discovery.discover(cursor).await?;
            report.discovered = batch.len();

            if batch.is_empty() {
                tracing::info!("No new acts to publish");
            } else {
                let outcome = self.publisher.publish(batch).await?;
                report.published = outcome.published;
                report.summarized = outcome.summarized;
                report.errors.extend(outcome.errors);
            }
        }

        tracing::info!(
            discovered = report.discovered,
            published = report.published,
            replied = report.replied,
            liked = report.liked,
            summarized = report.summarized,
            errors = report.errors.len(),
            "Run complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::act::ActReference;
    use crate::error::{BotError, GazetteError, TwitterError};
    use crate::twitter::{CreatedTweet, MockSocialApi};
    use async_trait::async_trait;

    struct Positions(Vec<u32>);

    #[async_trait]
    impl ActSource for Positions {
        async fn title(&self, reference: ActReference) -> Result<Option<String>, GazetteError> {
            Ok(self
                .0
                .contains(&reference.position)
                .then(|| format!("Ustawa nr {}", reference.position)))
        }

        async fn pdf(&self, _reference: ActReference) -> Result<Vec<u8>, GazetteError> {
            Ok(Vec::new())
        }
    }

    struct Blank;

    #[async_trait]
    impl PageRenderer for Blank {
        async fn page_count(&self, _pdf: &[u8]) -> Result<usize, GazetteError> {
            Ok(1)
        }

        async fn render_pages(&self, _pdf: &[u8]) -> Result<Vec<Vec<u8>>, GazetteError> {
            Ok(vec![vec![0]])
        }

        async fn extract_text(&self, _pdf: &[u8]) -> Result<String, GazetteError> {
            Ok(String::new())
        }
    }

    fn bot(dir: &tempfile::TempDir, social: MockSocialApi, positions: Vec<u32>) -> Bot {
        let config = BotConfig {
            marker_path: dir.path().join("last.txt"),
            ..Default::default()
        };
        Bot::new(
            &config,
            Tables::default(),
            Arc::new(Positions(positions)),
            Arc::new(Blank),
            Arc::new(social),
            None,
        )
    }

    #[tokio::test]
    async fn test_run_publishes_new_acts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("last.txt"), "Dz.U. 2021 poz. 9\n").unwrap();

        let mut social = MockSocialApi::new();
        social
            .expect_upload_image()
            .times(2)
            .returning(|_| Ok("m".into()));
        social.expect_post().times(2).returning(|_| {
            Ok(CreatedTweet {
                id: "1".into(),
                text: String::new(),
            })
        });

        let report = bot(&dir, social, vec![10, 11])
            .run(RunOptions::default(), 2021)
            .await
            .unwrap();

        assert_eq!(report.discovered, 2);
        assert_eq!(report.published, 2);
        let marker = std::fs::read_to_string(dir.path().join("last.txt")).unwrap();
        assert_eq!(marker, "Dz.U. 2021 poz. 11\n");
    }

    #[tokio::test]
    async fn test_run_fails_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut social = MockSocialApi::new();
        social.expect_post().never();

        let result = bot(&dir, social, vec![1])
            .run(RunOptions::default(), 2021)
            .await;

        assert!(matches!(result, Err(BotError::Marker(_))));
    }

    #[tokio::test]
    async fn test_side_stage_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut social = MockSocialApi::new();
        social
            .expect_latest_like()
            .returning(|| Err(TwitterError::RateLimited { retry_after: 60 }));
        social
            .expect_latest_own_post()
            .returning(|| Err(TwitterError::RateLimited { retry_after: 60 }));

        let report = bot(&dir, social, Vec::new())
            .run(
                RunOptions {
                    like: true,
                    respond: true,
                    discover: false,
                },
                2021,
            )
            .await
            .unwrap();

        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.published, 0);
    }
}
