//! Likes recent posts that mention the Journal of Laws.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::error::BotResult;
use crate::twitter::SocialApi;

/// Phrases searched for, covering the Polish declensions of the name.
pub const KEYWORDS: [&str; 6] = [
    "#DziennikUstaw",
    "Dziennik Ustaw",
    "Dzienniku Ustaw",
    "Dziennika Ustaw",
    "Dziennikiem Ustaw",
    "Dziennikowi Ustaw",
];

/// Result of one liking pass.
#[derive(Debug, Default)]
pub struct LikeOutcome {
    /// Posts liked.
    pub liked: usize,
    /// Non-fatal failures.
    pub errors: Vec<String>,
}

/// Likes posts from other accounts that mention the keywords.
pub struct Liker {
    social: Arc<dyn SocialApi>,
    handle: String,
    dry_run: bool,
}

impl Liker {
    /// Create a liker for the account `handle`.
    #[must_use]
    pub fn new(social: Arc<dyn SocialApi>, handle: impl Into<String>, dry_run: bool) -> Self {
        Self {
            social,
            handle: handle.into(),
            dry_run,
        }
    }

    /// Search query for one keyword, excluding own posts and retweets.
    #[must_use]
    pub fn query(&self, keyword: &str) -> String {
        let keyword = if keyword.contains(' ') {
            format!("\"{keyword}\"")
        } else {
            keyword.to_string()
        };
        format!("{keyword} -from:{} -is:retweet", self.handle)
    }

    /// Like everything posted since the most recent like.
    ///
    /// A failed search or like is logged and skipped.
    #[instrument(skip(self))]
    pub async fn like_recent(&self) -> BotResult<LikeOutcome> {
        let since_id = self.social.latest_like().await?.map(|tweet| tweet.id);
        tracing::debug!(since_id = ?since_id, "Liking posts since");

        let mut outcome = LikeOutcome::default();
        let mut seen = HashSet::new();

        for keyword in KEYWORDS {
            let found = match self.social.search(&self.query(keyword), since_id.clone()).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(keyword, error = %e, "Search failed");
                    outcome.errors.push(format!("search {keyword}: {e}"));
                    continue;
                }
            };

            for tweet in found {
                if !seen.insert(tweet.id.clone()) {
                    continue;
                }
                if self.dry_run {
                    tracing::warn!(id = %tweet.id, "DRY RUN, not liking");
                    continue;
                }
                match self.social.like(&tweet.id).await {
                    Ok(()) => {
                        tracing::info!(id = %tweet.id, keyword, "Liked");
                        outcome.liked += 1;
                    }
                    Err(e) => {
                        tracing::warn!(id = %tweet.id, error = %e, "Like failed");
                        outcome.errors.push(format!("like {}: {e}", tweet.id));
                    }
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TwitterError;
    use crate::twitter::{MockSocialApi, Tweet};

    #[test]
    fn test_query_quotes_phrases() {
        let liker = Liker::new(Arc::new(MockSocialApi::new()), "Dziennik_Ustaw", false);
        assert_eq!(
            liker.query("#DziennikUstaw"),
            "#DziennikUstaw -from:Dziennik_Ustaw -is:retweet"
        );
        assert_eq!(
            liker.query("Dzienniku Ustaw"),
            "\"Dzienniku Ustaw\" -from:Dziennik_Ustaw -is:retweet"
        );
    }

    #[tokio::test]
    async fn test_likes_each_post_once() {
        let mut social = MockSocialApi::new();
        social
            .expect_latest_like()
            .returning(|| Ok(Some(Tweet::new("10", "stary"))));
        social
            .expect_search()
            .withf(|_, since| since.as_deref() == Some("10"))
            .times(KEYWORDS.len())
            .returning(|query, _| {
                if query.starts_with("#DziennikUstaw") || query.starts_with("\"Dziennik Ustaw\"") {
                    Ok(vec![Tweet::new("11", "a"), Tweet::new("12", "b")])
                } else {
                    Ok(Vec::new())
                }
            });
        social.expect_like().times(2).returning(|_| Ok(()));

        let outcome = Liker::new(Arc::new(social), "Dziennik_Ustaw", false)
            .like_recent()
            .await
            .unwrap();
        assert_eq!(outcome.liked, 2);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let mut social = MockSocialApi::new();
        social.expect_latest_like().returning(|| Ok(None));
        social
            .expect_search()
            .withf(|query, since| query.starts_with("#DziennikUstaw") && since.is_none())
            .returning(|_, _| Err(TwitterError::RateLimited { retry_after: 60 }));
        social
            .expect_search()
            .returning(|_, _| Ok(vec![Tweet::new("20", "x"), Tweet::new("21", "y")]));
        social
            .expect_like()
            .withf(|id| id == "20")
            .returning(|_| {
                Err(TwitterError::Api {
                    status: 403,
                    message: "Forbidden".into(),
                })
            });
        social.expect_like().withf(|id| id == "21").returning(|_| Ok(()));

        let outcome = Liker::new(Arc::new(social), "Dziennik_Ustaw", false)
            .like_recent()
            .await
            .unwrap();
        assert_eq!(outcome.liked, 1);
        assert_eq!(outcome.errors.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_likes_nothing() {
        let mut social = MockSocialApi::new();
        social.expect_latest_like().returning(|| Ok(None));
        social
            .expect_search()
            .returning(|_, _| Ok(vec![Tweet::new("30", "x")]));
        social.expect_like().never();

        let outcome = Liker::new(Arc::new(social), "Dziennik_Ustaw", true)
            .like_recent()
            .await
            .unwrap();
        assert_eq!(outcome.liked, 0);
    }
}
