//! Replies to mentions that cite an act.

use std::sync::Arc;

use tracing::instrument;

use crate::act::{citation_line, parse_citation, ActReference};
use crate::discovery::Discovery;
use crate::error::BotResult;
use crate::twitter::{CreateTweetRequest, SocialApi, Tweet};

/// The act a mention asks about, if it can be identified.
///
/// A citation with neither year nor legacy number refers to the current
/// year. Pre-2012 citations without a legacy number are ambiguous and
/// skipped.
#[must_use]
pub fn citation_target(text: &str, current_year: u32) -> Option<ActReference> {
    let mut reference = parse_citation(text);
    if !reference.is_found() {
        return None;
    }
    if reference.year == 0 && reference.number == 0 {
        reference.year = current_year;
    }
    if reference.is_ambiguous() {
        tracing::debug!(%reference, "Legacy citation without Nr, skipping");
        return None;
    }
    Some(reference)
}

/// Answers mentions citing acts with a link to the post about them.
pub struct Responder {
    social: Arc<dyn SocialApi>,
    discovery: Arc<Discovery>,
    handle: String,
}

impl Responder {
    /// Create a responder posting as `handle`.
    #[must_use]
    pub fn new(social: Arc<dyn SocialApi>, discovery: Arc<Discovery>, handle: impl Into<String>) -> Self {
        Self {
            social,
            discovery,
            handle: handle.into(),
        }
    }

    /// Collect replies for mentions posted since the account's last post.
    ///
    /// Failures for one mention are logged and the mention is skipped.
    #[instrument(skip(self))]
    pub async fn prepare_replies(&self, current_year: u32) -> BotResult<Vec<CreateTweetRequest>> {
        let Some(latest) = self.social.latest_own_post().await? else {
            tracing::info!("No own posts yet, nothing to reply to");
            return Ok(Vec::new());
        };

        let query = format!("-from:{} -is:retweet \"Dz.U.\"", self.handle);
        let mentions = self.social.search(&query, Some(latest.id)).await?;
        tracing::info!(mentions = mentions.len(), "Found mentions");

        let mut replies = Vec::new();
        for mention in mentions {
            let Some(reference) = citation_target(&mention.text, current_year) else {
                continue;
            };

            match self.reply_for(&mention, reference).await {
                Ok(Some(reply)) => replies.push(reply),
                Ok(None) => {
                    tracing::info!(id = %mention.id, %reference, "Act not published, no reply");
                }
                Err(e) => {
                    tracing::warn!(id = %mention.id, %reference, error = %e, "Skipping mention");
                }
            }
        }

        Ok(replies)
    }

    async fn reply_for(
        &self,
        mention: &Tweet,
        reference: ActReference,
    ) -> BotResult<Option<CreateTweetRequest>> {
        let citation = citation_line(reference, self.discovery.composer().tables());
        let query = format!("from:{} \"{citation}\"", self.handle);

        if let Some(existing) = self.social.search(&query, None).await?.into_iter().next() {
            tracing::debug!(id = %existing.id, "Linking to existing post");
            let link = format!("https://twitter.com/{}/status/{}", self.handle, existing.id);
            return Ok(Some(CreateTweetRequest::text(link).in_reply_to(&mention.id)));
        }

        let Some(pending) = self.discovery.prepare(reference).await? else {
            return Ok(None);
        };
        Ok(Some(
            CreateTweetRequest::from_draft(&pending.draft).in_reply_to(&mention.id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::act::{PostComposer, Tables, TitleTransformer, DEFAULT_BASE_URL};
    use crate::discovery::DiscoveryConfig;
    use crate::error::{GazetteError, TwitterError};
    use crate::gazette::{ActSource, PageRenderer};
    use crate::twitter::MockSocialApi;
    use async_trait::async_trait;

    struct OneAct {
        reference: ActReference,
    }

    #[async_trait]
    impl ActSource for OneAct {
        async fn title(&self, reference: ActReference) -> Result<Option<String>, GazetteError> {
            if reference == self.reference {
                Ok(Some("Ustawa z dnia 1 lutego 2021 r. o zmianie ustawy".into()))
            } else if reference.position == 999 {
                Err(GazetteError::Status {
                    status: 503,
                    url: "https://dziennikustaw.gov.pl/DU/2021/999".into(),
                })
            } else {
                Ok(None)
            }
        }

        async fn pdf(&self, _reference: ActReference) -> Result<Vec<u8>, GazetteError> {
            Ok(b"%PDF".to_vec())
        }
    }

    struct NoPages;

    #[async_trait]
    impl PageRenderer for NoPages {
        async fn page_count(&self, _pdf: &[u8]) -> Result<usize, GazetteError> {
            Ok(10)
        }

        async fn render_pages(&self, _pdf: &[u8]) -> Result<Vec<Vec<u8>>, GazetteError> {
            Ok(Vec::new())
        }

        async fn extract_text(&self, _pdf: &[u8]) -> Result<String, GazetteError> {
            Ok(String::new())
        }
    }

    fn responder(social: MockSocialApi) -> Responder {
        let social: Arc<dyn SocialApi> = Arc::new(social);
        let discovery = Discovery::new(
            Arc::new(OneAct {
                reference: ActReference::new(2021, 0, 50),
            }),
            Arc::new(NoPages),
            social.clone(),
            PostComposer::new(TitleTransformer::new(Tables::default()), DEFAULT_BASE_URL),
            DiscoveryConfig::default(),
        );
        Responder::new(social, Arc::new(discovery), "Dziennik_Ustaw")
    }

    #[test]
    fn test_citation_target_defaults_year() {
        assert_eq!(
            citation_target("zob. Dz.U. poz. 12", 2021),
            Some(ActReference::new(2021, 0, 12))
        );
        assert_eq!(
            citation_target("Dz.U. 2020 poz. 2146", 2021),
            Some(ActReference::new(2020, 0, 2146))
        );
    }

    #[test]
    fn test_citation_target_skips_unusable() {
        assert_eq!(citation_target("brak cytatu", 2021), None);
        assert_eq!(citation_target("Dz. U. z 2004 r. poz. 535", 2021), None);
        assert_eq!(
            citation_target("Dz. U. z 2004 r. Nr 54, poz. 535", 2021),
            Some(ActReference::new(2004, 54, 535))
        );
    }

    #[tokio::test]
    async fn test_no_own_posts_means_no_replies() {
        let mut social = MockSocialApi::new();
        social.expect_latest_own_post().returning(|| Ok(None));
        social.expect_search().never();

        let replies = responder(social).prepare_replies(2021).await.unwrap();
        assert!(replies.is_empty());
    }

    #[tokio::test]
    async fn test_links_existing_post() {
        let mut social = MockSocialApi::new();
        social
            .expect_latest_own_post()
            .returning(|| Ok(Some(Tweet::new("500", "Dz.U. 2021 poz. 49"))));
        social
            .expect_search()
            .withf(|query, since| {
                query == "-from:Dziennik_Ustaw -is:retweet \"Dz.U.\"" && since.as_deref() == Some("500")
            })
            .returning(|_, _| Ok(vec![Tweet::new("600", "Co to jest Dz.U. 2021 poz. 7?")]));
        social
            .expect_search()
            .withf(|query, since| {
                query == "from:Dziennik_Ustaw \"Dz.U. 2021 poz. 7\"" && since.is_none()
            })
            .returning(|_, _| Ok(vec![Tweet::new("42", "Dz.U. 2021 poz. 7\n...")]));

        let replies = responder(social).prepare_replies(2021).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "https://twitter.com/Dziennik_Ustaw/status/42");
        assert_eq!(
            replies[0].reply.as_ref().unwrap().in_reply_to_tweet_id,
            "600"
        );
    }

    #[tokio::test]
    async fn test_composes_new_post_when_none_exists() {
        let mut social = MockSocialApi::new();
        social
            .expect_latest_own_post()
            .returning(|| Ok(Some(Tweet::new("500", "Dz.U. 2021 poz. 49"))));
        social
            .expect_search()
            .withf(|_, since| since.is_some())
            .returning(|_, _| {
                Ok(vec![
                    Tweet::new("601", "Dz.U. 2021 poz. 50"),
                    Tweet::new("602", "Dz.U. 2021 poz. 999"),
                    Tweet::new("603", "Dz.U. 2021 poz. 51"),
                ])
            });
        social
            .expect_search()
            .withf(|_, since| since.is_none())
            .returning(|_, _| Ok(Vec::new()));
        social.expect_upload_image().never();

        let replies = responder(social).prepare_replies(2021).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].text.starts_with("Dz.U. 2021 poz. 50\n"));
        assert_eq!(
            replies[0].reply.as_ref().unwrap().in_reply_to_tweet_id,
            "601"
        );
        assert!(replies[0].media.is_none());
    }

    #[tokio::test]
    async fn test_search_failure_is_fatal_for_the_scan() {
        let mut social = MockSocialApi::new();
        social
            .expect_latest_own_post()
            .returning(|| Err(TwitterError::RateLimited { retry_after: 900 }));

        assert!(responder(social).prepare_replies(2021).await.is_err());
    }
}
