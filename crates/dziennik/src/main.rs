//! Dziennik Ustaw bot CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dziennik::act::{parse_citation, DEFAULT_BASE_URL, MAX_TITLE_LENGTH};
use dziennik::config::{BotConfig, DEFAULT_MARKER_PATH};
use dziennik::discovery::{DEFAULT_BATCH_CAP, DEFAULT_MAX_PAGES};
use dziennik::gazette::{GazetteClient, PdfRenderer};
use dziennik::pipeline::{Bot, RunOptions, RunReport};
use dziennik::summary::{AnthropicSummarizer, Summarize, SummaryConfig, DEFAULT_SUMMARY_MODEL};
use dziennik::twitter::{TwitterClient, DEFAULT_HANDLE, DEFAULT_USER_ID};

/// Dziennik Ustaw bot - announces new acts of the Polish Journal of Laws.
#[derive(Parser)]
#[command(name = "dziennik")]
#[command(about = "Posts newly published acts of the Journal of Laws")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover and post new acts (for cron use)
    Run {
        #[command(flatten)]
        bot: BotArgs,

        /// Like recent posts mentioning the Journal of Laws first
        #[arg(long, env = "DZIENNIK_LIKE")]
        like: bool,

        /// Reply to mentions citing acts first
        #[arg(long, env = "DZIENNIK_RESPOND")]
        respond: bool,
    },

    /// Only reply to mentions citing acts
    Respond {
        #[command(flatten)]
        bot: BotArgs,
    },

    /// Only like recent posts mentioning the Journal of Laws
    Like {
        #[command(flatten)]
        bot: BotArgs,
    },

    /// Print the act reference found in a text
    Parse {
        /// Text containing a Dz.U. citation
        text: String,
    },

    /// Print the post composed for an act, without network access
    Compose {
        /// Publication year
        #[arg(long)]
        year: u32,

        /// Position within the year
        #[arg(long)]
        position: u32,

        /// Legacy issue number (pre-2012 acts)
        #[arg(long, default_value_t = 0)]
        number: u32,

        /// TOML file with handle, emoji and milestone tables
        #[arg(long, env = "DZIENNIK_TABLES")]
        tables: Option<PathBuf>,

        /// Title budget in characters
        #[arg(long, default_value_t = MAX_TITLE_LENGTH)]
        max_title_length: usize,

        /// Raw act title
        title: String,
    },
}

/// Settings shared by the networked commands.
#[derive(Args)]
pub struct BotArgs {
    /// Gazette site root
    #[arg(long, env = "DZIENNIK_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// File holding the last posted citation line
    #[arg(long, env = "DZIENNIK_MARKER", default_value = DEFAULT_MARKER_PATH)]
    marker: PathBuf,

    /// Acts posted per run (0 = until the first missing act)
    #[arg(long, env = "DZIENNIK_BATCH_CAP", default_value_t = DEFAULT_BATCH_CAP)]
    batch_cap: usize,

    /// Title budget in characters
    #[arg(long, env = "DZIENNIK_MAX_TITLE_LENGTH", default_value_t = MAX_TITLE_LENGTH)]
    max_title_length: usize,

    /// Acts with more pages are posted without images
    #[arg(long, env = "DZIENNIK_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: usize,

    /// Do everything except upload, post, like and write the marker (also set by DRY)
    #[arg(long)]
    dry_run: bool,

    /// Skip TLS certificate verification for the gazette site
    #[arg(long, env = "DZIENNIK_ACCEPT_INVALID_CERTS")]
    accept_invalid_certs: bool,

    /// Account handle, without @
    #[arg(long, env = "DZIENNIK_HANDLE", default_value = DEFAULT_HANDLE)]
    handle: String,

    /// Account numeric ID
    #[arg(long, env = "DZIENNIK_USER_ID", default_value = DEFAULT_USER_ID)]
    user_id: String,

    /// Reply to each post with an AI summary (needs ANTHROPIC_API_KEY)
    #[arg(long, env = "DZIENNIK_SUMMARIES")]
    summaries: bool,

    /// Model used for summaries
    #[arg(long, env = "DZIENNIK_SUMMARY_MODEL", default_value = DEFAULT_SUMMARY_MODEL)]
    summary_model: String,

    /// TOML file with handle, emoji and milestone tables
    #[arg(long, env = "DZIENNIK_TABLES")]
    tables: Option<PathBuf>,
}

impl BotArgs {
    fn into_config(self) -> BotConfig {
        BotConfig {
            base_url: self.base_url,
            marker_path: self.marker,
            batch_cap: Some(self.batch_cap),
            max_title_length: self.max_title_length,
            max_pages: self.max_pages,
            dry_run: self.dry_run || BotConfig::dry_run_from_env(),
            accept_invalid_certs: self.accept_invalid_certs,
            handle: self.handle,
            user_id: self.user_id,
            summaries: self.summaries,
            summary_model: self.summary_model,
            tables_path: self.tables,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("dziennik=debug,info")
        } else {
            EnvFilter::new("dziennik=info,warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { bot, like, respond } => {
            let options = RunOptions {
                like,
                respond,
                discover: true,
            };
            run_bot(bot.into_config(), options).await
        }
        Commands::Respond { bot } => {
            let options = RunOptions {
                like: false,
                respond: true,
                discover: false,
            };
            run_bot(bot.into_config(), options).await
        }
        Commands::Like { bot } => {
            let options = RunOptions {
                like: true,
                respond: false,
                discover: false,
            };
            run_bot(bot.into_config(), options).await
        }
        Commands::Parse { text } => {
            run_parse(&text);
            Ok(())
        }
        Commands::Compose {
            year,
            position,
            number,
            tables,
            max_title_length,
            title,
        } => {
            let config = BotConfig {
                tables_path: tables,
                max_title_length,
                ..Default::default()
            };
            let composer = config.composer(config.tables()?);
            println!("{}", composer.compose_text(year, number, position, &title));
            Ok(())
        }
    }
}

async fn run_bot(config: BotConfig, options: RunOptions) -> Result<()> {
    if config.dry_run {
        tracing::warn!("DRY RUN: nothing will be uploaded, posted, liked or saved");
    }

    let tables = config.tables()?;
    let source = GazetteClient::new(config.gazette_config())
        .context("Failed to create gazette client")?;
    let renderer = PdfRenderer::new();

    let social =
        TwitterClient::new(config.twitter_config()?).context("Failed to create Twitter client")?;

    let summarizer = if config.summaries {
        summarizer(&config)?
    } else {
        None
    };

    let bot = Bot::new(
        &config,
        tables,
        Arc::new(source),
        Arc::new(renderer),
        Arc::new(social),
        summarizer,
    );

    let current_year = chrono::Local::now().year() as u32;
    let report = bot
        .run(options, current_year)
        .await
        .context("Run failed")?;

    print_report(&report);
    Ok(())
}

fn summarizer(config: &BotConfig) -> Result<Option<Arc<dyn Summarize>>> {
    let Some(summary_config) = SummaryConfig::from_env() else {
        tracing::warn!("ANTHROPIC_API_KEY not set - skipping summaries");
        return Ok(None);
    };

    let summarizer = AnthropicSummarizer::new(summary_config.with_model(config.summary_model.clone()))
        .context("Failed to create summarizer")?;
    Ok(Some(Arc::new(summarizer)))
}

fn run_parse(text: &str) {
    let reference = parse_citation(text);
    if reference.is_found() {
        println!(
            "year: {}\nnumber: {}\nposition: {}",
            reference.year, reference.number, reference.position
        );
        if reference.is_ambiguous() {
            println!("(pre-2012 citation without Nr, cannot be identified)");
        }
    } else {
        println!("No citation found.");
    }
}

fn print_report(report: &RunReport) {
    println!("\nRun Summary");
    println!("   Discovered: {}", report.discovered);
    println!("   Published: {}", report.published);
    println!("   Summarized: {}", report.summarized);
    println!("   Replied: {}", report.replied);
    println!("   Liked: {}", report.liked);

    if !report.errors.is_empty() {
        println!("   Errors: {}", report.errors.len());
        for err in &report.errors {
            eprintln!("     - {err}");
        }
    }
}
