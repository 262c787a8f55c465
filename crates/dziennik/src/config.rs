//! Bot configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::act::{PostComposer, Tables, TitleTransformer, DEFAULT_BASE_URL, MAX_TITLE_LENGTH};
use crate::discovery::{DiscoveryConfig, DEFAULT_BATCH_CAP, DEFAULT_MAX_PAGES};
use crate::gazette::GazetteConfig;
use crate::summary::DEFAULT_SUMMARY_MODEL;
use crate::twitter::{TwitterConfig, DEFAULT_HANDLE, DEFAULT_USER_ID};

/// Default marker file.
pub const DEFAULT_MARKER_PATH: &str = "last.txt";

/// Environment variable whose presence enables dry run.
pub const DRY_RUN_ENV: &str = "DRY";

/// Settings for one bot run.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Gazette site root.
    pub base_url: String,
    /// File holding the last posted citation line.
    pub marker_path: PathBuf,
    /// Acts prepared per run; `None` or `Some(0)` scans until the first miss.
    pub batch_cap: Option<usize>,
    /// Title budget in characters.
    pub max_title_length: usize,
    /// Page count above which acts are posted without images.
    pub max_pages: usize,
    /// Run everything but never upload, post, like or write the marker.
    pub dry_run: bool,
    /// Skip TLS verification for gazette requests.
    pub accept_invalid_certs: bool,
    /// Account handle, without `@`.
    pub handle: String,
    /// Account numeric ID.
    pub user_id: String,
    /// Reply to each post with an AI summary.
    pub summaries: bool,
    /// Model used for summaries.
    pub summary_model: String,
    /// TOML file replacing the built-in handle, emoji and milestone tables.
    pub tables_path: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
            batch_cap: Some(DEFAULT_BATCH_CAP),
            max_title_length: MAX_TITLE_LENGTH,
            max_pages: DEFAULT_MAX_PAGES,
            dry_run: false,
            accept_invalid_certs: false,
            handle: DEFAULT_HANDLE.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            summaries: false,
            summary_model: DEFAULT_SUMMARY_MODEL.to_string(),
            tables_path: None,
        }
    }
}

impl BotConfig {
    /// Whether `DRY` is set in the environment, whatever its value.
    #[must_use]
    pub fn dry_run_from_env() -> bool {
        std::env::var_os(DRY_RUN_ENV).is_some()
    }

    /// Load the substitution tables, falling back to the built-in ones.
    pub fn tables(&self) -> Result<Tables> {
        match &self.tables_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading tables");
                Tables::load(path)
            }
            None => Ok(Tables::default()),
        }
    }

    /// Composer for posts with the configured title budget.
    #[must_use]
    pub fn composer(&self, tables: Tables) -> PostComposer {
        PostComposer::new(
            TitleTransformer::with_max_length(tables, self.max_title_length),
            self.base_url.clone(),
        )
    }

    /// Gazette client settings.
    #[must_use]
    pub fn gazette_config(&self) -> GazetteConfig {
        GazetteConfig {
            base_url: self.base_url.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
            ..Default::default()
        }
    }

    /// Twitter settings for the configured account.
    ///
    /// Credentials come from the environment. A dry run never uploads, posts
    /// or likes, so it goes ahead without them; reads then fail per request
    /// and are reported with the run.
    pub fn twitter_config(&self) -> Result<TwitterConfig> {
        let config = match TwitterConfig::from_env() {
            Ok(config) => config,
            Err(e) if self.dry_run => {
                tracing::warn!(error = %e, "Twitter credentials missing, dry run continues unsigned");
                TwitterConfig::default()
            }
            Err(e) => return Err(e).context("Twitter credentials missing"),
        };
        Ok(config.with_account(self.handle.clone(), self.user_id.clone()))
    }

    /// Discovery settings.
    #[must_use]
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            batch_cap: self.batch_cap,
            max_pages: self.max_pages,
            extract_text: self.summaries,
            dry_run: self.dry_run,
        }
    }
}
