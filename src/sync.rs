// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use tracing::{info, instrument, warn};
use url::Url;

use crate::archive::{ArchivePaginator, EpisodeRef, PageLimits};
use crate::episode::{EpisodeNumber, canonicalize, extract_episode};
use crate::error::SyncError;
use crate::feed::{FeedItem, ResolvedAudio, Variant, build_feed_items};
use crate::http::{HttpClient, fetch_page};
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::repeats::RepeatList;
use crate::state::FeedState;

/// Number of episodes a test run processes
pub const TEST_EPISODE_LIMIT: usize = 5;

/// Default politeness delay between network calls
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Which kind of run to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Rebuild the whole feed from every archive page
    All,
    /// Rebuild the feed from the first `n` episodes of the first page
    Test(usize),
    /// Add episodes from the first page that are new and recent
    Incremental,
}

impl SyncMode {
    /// Maximum number of episodes to process (None = all)
    pub fn episode_limit(&self) -> Option<usize> {
        match self {
            SyncMode::Test(n) => Some(*n),
            SyncMode::All | SyncMode::Incremental => None,
        }
    }

    pub fn page_limits(&self) -> PageLimits {
        match self {
            SyncMode::All => PageLimits::UNBOUNDED,
            SyncMode::Test(_) | SyncMode::Incremental => PageLimits::FIRST_PAGE_ONLY,
        }
    }

    /// Whether the run builds on the previous output instead of the seed
    pub fn continues_previous(&self) -> bool {
        matches!(self, SyncMode::Incremental)
    }

    /// Oldest air date still accepted, relative to `today`
    pub fn recency_cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            SyncMode::Incremental => today.checked_sub_days(Days::new(1)),
            SyncMode::All | SyncMode::Test(_) => None,
        }
    }
}

/// Cooperative cancellation, checked between episodes
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for feed synchronization
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// First archive listing page
    pub archive_url: Url,
    /// Seed template; the built-in channel is used when absent
    pub seed: Option<PathBuf>,
    /// Feed document to write (and, incrementally, to continue from)
    pub output: PathBuf,
    pub repeats: RepeatList,
    /// Pause between consecutive network calls
    pub delay: Duration,
    /// Date the recency cutoff is computed from
    pub today: NaiveDate,
}

impl SyncOptions {
    pub fn new(mode: SyncMode, archive_url: Url, output: PathBuf) -> Self {
        Self {
            mode,
            archive_url,
            seed: None,
            output,
            repeats: RepeatList::default(),
            delay: DEFAULT_DELAY,
            today: Local::now().date_naive(),
        }
    }
}

/// Result of a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Feed items added to the feed
    pub published: usize,
    /// Episodes that failed to produce any item
    pub skipped: usize,
    /// Episodes (or items) already present in the previous feed
    pub already_known: usize,
    /// Episodes older than the recency cutoff
    pub outdated: usize,
    /// Items dropped because the same episode and variant was already merged
    pub duplicates: usize,
    /// Items in the written feed
    pub total_items: usize,
    /// The run was interrupted before the archive was exhausted
    pub cancelled: bool,
    /// Details of failures (episode or URL, error message)
    pub failures: Vec<(String, String)>,
}

/// What happened to one episode reference
enum EpisodeOutcome {
    Collected(Vec<FeedItem>),
    Known,
    Outdated,
    Skipped(String),
}

/// Per-run context shared by every episode
struct EpisodeContext<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    options: &'a SyncOptions,
    known: HashSet<EpisodeNumber>,
    cutoff: Option<NaiveDate>,
    reporter: &'a SharedProgressReporter,
}

/// Synchronize the archive into the feed document
///
/// This is the main entry point for the library. It:
/// 1. Loads the feed state (seed or previous output, depending on mode)
/// 2. Walks the archive, one episode page at a time
/// 3. Extracts each episode and resolves its audio URLs
/// 4. Merges the new items, sorts the feed, and writes it atomically
///
/// Episode-level failures are counted and reported, never fatal. Only a
/// failure to load or persist the feed aborts the run.
pub async fn sync_feed<C: HttpClient + ?Sized>(
    client: &C,
    options: &SyncOptions,
    reporter: SharedProgressReporter,
    cancel: &CancelFlag,
) -> Result<SyncReport, SyncError> {
    let mode = options.mode;
    let mut state = FeedState::load(&mode, options.seed.as_deref(), &options.output)?;

    reporter.report(ProgressEvent::StateLoaded {
        source: state.source().to_string(),
        existing_items: state.items().len(),
    });

    let context = EpisodeContext {
        client,
        options,
        known: state.known_numbers(),
        cutoff: mode.recency_cutoff(options.today),
        reporter: &reporter,
    };

    let mut paginator = ArchivePaginator::new(
        client,
        options.archive_url.clone(),
        mode.page_limits(),
        options.delay,
        reporter.clone(),
    );

    let mut report = SyncReport::default();
    let mut collected = Vec::new();
    let mut processed = 0;

    loop {
        if cancel.is_cancelled() {
            warn!(processed, "sync cancelled, keeping collected items");
            reporter.report(ProgressEvent::Cancelled);
            report.cancelled = true;
            break;
        }

        if mode.episode_limit().is_some_and(|limit| processed >= limit) {
            break;
        }

        let Some(reference) = paginator.next_reference().await else {
            break;
        };

        pause(options.delay).await;

        match process_episode(&context, &reference, processed).await {
            EpisodeOutcome::Collected(items) => collected.extend(items),
            EpisodeOutcome::Known => report.already_known += 1,
            EpisodeOutcome::Outdated => report.outdated += 1,
            EpisodeOutcome::Skipped(error) => {
                report.skipped += 1;
                report.failures.push((reference.url.to_string(), error));
            }
        }

        processed += 1;
    }

    let outcome = state.merge(collected, &mode);
    report.published = outcome.added;
    report.already_known += outcome.already_known;
    report.duplicates = outcome.duplicates;

    state.persist(&options.output)?;
    report.total_items = state.items().len();

    reporter.report(ProgressEvent::FeedPersisted {
        path: options.output.display().to_string(),
        total_items: report.total_items,
    });

    info!(
        published = report.published,
        skipped = report.skipped,
        already_known = report.already_known,
        outdated = report.outdated,
        pages = paginator.pages_fetched(),
        "sync finished"
    );

    reporter.report(ProgressEvent::SyncCompleted {
        published_count: report.published,
        known_count: report.already_known,
        outdated_count: report.outdated,
        skipped_count: report.skipped,
    });

    Ok(report)
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[instrument(level = "info", skip_all, fields(url = %reference.url))]
async fn process_episode<C: HttpClient + ?Sized>(
    context: &EpisodeContext<'_, C>,
    reference: &EpisodeRef,
    episode_index: usize,
) -> EpisodeOutcome {
    let reporter = context.reporter;
    let url = reference.url.to_string();

    reporter.report(ProgressEvent::FetchingEpisode {
        url: url.clone(),
        episode_index,
    });

    let skip = |error: String| {
        warn!(%url, %error, "skipping episode");
        reporter.report(ProgressEvent::EpisodeSkipped {
            url: url.clone(),
            error: error.clone(),
        });
        EpisodeOutcome::Skipped(error)
    };

    let page = match fetch_page(context.client, &url).await {
        Ok(page) => page,
        Err(e) => return skip(e.to_string()),
    };

    let page_url = match Url::parse(&page.final_url) {
        Ok(page_url) => page_url,
        Err(e) => return skip(e.to_string()),
    };

    let mut episode = match extract_episode(&page.body, &page_url, reference.title.as_deref()) {
        Ok(episode) => episode,
        Err(e) => return skip(e.to_string()),
    };

    if context.known.contains(&episode.number) {
        info!(number = %episode.number, "episode already in feed");
        reporter.report(ProgressEvent::EpisodeKnown {
            episode_number: episode.number.to_string(),
        });
        return EpisodeOutcome::Known;
    }

    if let (Some(cutoff), Some(air_date)) = (context.cutoff, episode.air_date)
        && air_date < cutoff
    {
        info!(number = %episode.number, %air_date, %cutoff, "episode older than cutoff");
        reporter.report(ProgressEvent::EpisodeOutdated {
            episode_number: episode.number.to_string(),
        });
        return EpisodeOutcome::Outdated;
    }

    let title = episode.display_title();
    let mut audio = ResolvedAudio::default();

    if let Some(raw) = episode.raw_audio_url.clone() {
        pause(context.options.delay).await;
        audio.explicit = resolve_variant(context, &title, Variant::Explicit, &raw).await;
    }

    if let Some(raw) = episode.clean_audio_url.clone() {
        pause(context.options.delay).await;
        audio.clean = resolve_variant(context, &title, Variant::Clean, &raw).await;
    }

    if let Some(explicit) = &audio.explicit {
        episode.mark_promo_from(explicit);
    }

    let is_repeat = context.options.repeats.contains(&episode.number);
    let items = build_feed_items(&episode, &audio, is_repeat);

    if items.is_empty() {
        return skip(format!("no resolvable audio for {title}"));
    }

    info!(number = %episode.number, items = items.len(), "collected episode");
    reporter.report(ProgressEvent::EpisodeCollected {
        episode_title: title,
        item_count: items.len(),
    });

    EpisodeOutcome::Collected(items)
}

async fn resolve_variant<C: HttpClient + ?Sized>(
    context: &EpisodeContext<'_, C>,
    title: &str,
    variant: Variant,
    raw: &Url,
) -> Option<Url> {
    match canonicalize(context.client, raw.as_str()).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(%title, variant = variant.name(), error = %e, "dropping audio variant");
            context.reporter.report(ProgressEvent::VariantDropped {
                episode_title: title.to_string(),
                variant: variant.name().to_string(),
                error: e.to_string(),
            });
            None
        }
    }
}
