use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use url::Url;

use talsync::{
    CancelFlag, NoopReporter, ProgressEvent, ProgressReporter, RepeatList, ReqwestClient,
    SharedProgressReporter, SyncError, SyncMode, SyncOptions, TEST_EPISODE_LIMIT, sync_feed,
};

// Emoji with fallback for terminals without Unicode support
static RADIO: Emoji<'_, '_> = Emoji("📻 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static PAGE: Emoji<'_, '_> = Emoji("📄 ", "[i] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

const DEFAULT_ARCHIVE_URL: &str = "https://www.thisamericanlife.org/archive";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Rebuild the feed from the whole archive
    All,
    /// Rebuild the feed from the newest few episodes
    Test,
    /// Add new episodes to the existing feed
    #[value(alias = "latest")]
    Incremental,
}

impl From<Mode> for SyncMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => SyncMode::All,
            Mode::Test => SyncMode::Test(TEST_EPISODE_LIMIT),
            Mode::Incremental => SyncMode::Incremental,
        }
    }
}

/// Build and update an RSS feed from the This American Life archive
#[derive(Parser, Debug)]
#[command(name = "talsync")]
#[command(about = "Build and update an RSS feed from the This American Life archive")]
#[command(version)]
struct Args {
    /// Kind of run to perform
    #[arg(value_enum, env = "TALSYNC_MODE", default_value = "incremental")]
    mode: Mode,

    /// Feed document to write
    #[arg(short, long, default_value = "feed.xml")]
    output: PathBuf,

    /// Feed template supplying channel metadata
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// First page of the episode archive
    #[arg(long, default_value = DEFAULT_ARCHIVE_URL)]
    archive_url: Url,

    /// File listing re-aired episode numbers, one per line
    #[arg(short, long)]
    repeats: Option<PathBuf>,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value = "10")]
    timeout_secs: u64,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Log progress details to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Progress reporter using an indicatif spinner
struct IndicatifReporter {
    spinner: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Result<Self> {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .context("Invalid progress template")?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));

        Ok(Self { spinner })
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StateLoaded {
                source,
                existing_items,
            } => {
                self.spinner.println(format!(
                    "{PAGE}Starting from {} ({} items)",
                    source.cyan(),
                    existing_items.to_string().cyan()
                ));
            }

            ProgressEvent::FetchingArchivePage { url, page_number } => {
                self.spinner.set_message(format!(
                    "{SEARCH}Archive page {}: {}",
                    page_number.to_string().cyan(),
                    url.dimmed()
                ));
            }

            ProgressEvent::ArchivePageParsed { .. } => {}

            ProgressEvent::ArchivePageFailed { url, error } => {
                self.spinner.println(format!(
                    "{FAILURE}Archive page {} - {}",
                    url.red(),
                    error.red()
                ));
            }

            ProgressEvent::FetchingEpisode { url, episode_index } => {
                self.spinner.set_message(format!(
                    "[{}] {}",
                    (episode_index + 1).to_string().cyan(),
                    url
                ));
            }

            ProgressEvent::EpisodeCollected {
                episode_title,
                item_count,
            } => {
                self.spinner.println(format!(
                    "  {SUCCESS}{} ({} items)",
                    truncate_title(&episode_title, 50).green(),
                    item_count
                ));
            }

            ProgressEvent::EpisodeKnown { episode_number } => {
                self.spinner.println(format!(
                    "  {} {}",
                    episode_number.yellow(),
                    "already in feed".dimmed()
                ));
            }

            ProgressEvent::EpisodeOutdated { episode_number } => {
                self.spinner.println(format!(
                    "  {} {}",
                    episode_number.yellow(),
                    "too old for this run".dimmed()
                ));
            }

            ProgressEvent::EpisodeSkipped { url, error } => {
                self.spinner.println(format!(
                    "  {FAILURE}{} - {}",
                    url.red(),
                    error.red()
                ));
            }

            ProgressEvent::VariantDropped {
                episode_title,
                variant,
                error,
            } => {
                self.spinner.println(format!(
                    "  {CROSS}{} {} - {}",
                    truncate_title(&episode_title, 40).yellow(),
                    variant,
                    error.dimmed()
                ));
            }

            ProgressEvent::Cancelled => {
                self.spinner
                    .println(format!("{}", "Interrupted, saving collected episodes".yellow()));
            }

            ProgressEvent::FeedPersisted { path, total_items } => {
                self.spinner.set_message(format!(
                    "{FOLDER}Wrote {} items to {}",
                    total_items.to_string().cyan(),
                    path.cyan()
                ));
            }

            ProgressEvent::SyncCompleted {
                published_count,
                known_count,
                outdated_count,
                skipped_count,
            } => {
                self.spinner.finish_and_clear();
                if published_count == 0 {
                    println!("\n{PARTY}{}", "No new episodes".bold().green());
                } else {
                    println!(
                        "\n{PARTY}{} {} published",
                        "Sync complete:".bold().green(),
                        published_count.to_string().green().bold()
                    );
                }
                println!(
                    "   {} known, {} outdated, {} skipped",
                    known_count.to_string().yellow(),
                    outdated_count.to_string().yellow(),
                    if skipped_count > 0 {
                        skipped_count.to_string().red().bold()
                    } else {
                        skipped_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn failure_context(error: &SyncError) -> &'static str {
    match error {
        SyncError::Store(e) if e.is_load_failure() => "Failed to load existing feed",
        SyncError::Store(_) => "Failed to write feed",
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            RADIO,
            "talsync".bold().magenta(),
            "- This American Life feed builder".dimmed()
        );
    }

    let client = ReqwestClient::new(Duration::from_secs(args.timeout_secs))
        .context("Failed to build HTTP client")?;

    let repeats = match &args.repeats {
        Some(path) => RepeatList::load(path).context("Failed to read repeat list")?,
        None => RepeatList::default(),
    };

    let options = SyncOptions {
        mode: args.mode.into(),
        archive_url: args.archive_url.clone(),
        seed: args.seed.clone(),
        output: args.output.clone(),
        repeats,
        delay: Duration::from_millis(args.delay_ms),
        today: Local::now().date_naive(),
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new()?)
    };

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let report = sync_feed(&client, &options, reporter, &cancel)
        .await
        .map_err(|e| {
            let message = failure_context(&e);
            anyhow::Error::new(e).context(message)
        })?;

    if !args.quiet && !report.failures.is_empty() {
        println!("\n{}", "Skipped episodes:".red().bold());
        for (url, error) in &report.failures {
            println!("  {}{} - {}", CROSS, url.yellow(), error.dimmed());
        }
    }

    if !args.quiet {
        println!(
            "\n{FOLDER}Output: {} ({} items)\n",
            args.output.display().to_string().cyan(),
            report.total_items
        );
    }

    Ok(())
}
