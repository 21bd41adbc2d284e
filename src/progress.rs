use std::sync::Arc;

/// Events emitted during feed synchronization for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Existing feed state was loaded
    StateLoaded {
        /// Path of the file the state came from, or "built-in seed"
        source: String,
        existing_items: usize,
    },

    /// An archive listing page is being fetched
    FetchingArchivePage { url: String, page_number: usize },

    /// An archive listing page was parsed
    ArchivePageParsed {
        url: String,
        references: usize,
        has_next: bool,
    },

    /// An archive listing page could not be fetched; traversal ends here
    ArchivePageFailed { url: String, error: String },

    /// An episode detail page is being fetched
    FetchingEpisode {
        url: String,
        /// Position of this episode in the traversal
        episode_index: usize,
    },

    /// An episode produced feed items
    EpisodeCollected {
        episode_title: String,
        item_count: usize,
    },

    /// An episode is already present in the feed
    EpisodeKnown { episode_number: String },

    /// An episode aired before the recency cutoff
    EpisodeOutdated { episode_number: String },

    /// An episode could not be turned into feed items
    EpisodeSkipped { url: String, error: String },

    /// One audio variant of an episode could not be resolved
    VariantDropped {
        episode_title: String,
        variant: String,
        error: String,
    },

    /// The run was interrupted; collected items are still written
    Cancelled,

    /// The feed document was written
    FeedPersisted { path: String, total_items: usize },

    /// Sync operation completed
    SyncCompleted {
        published_count: usize,
        known_count: usize,
        outdated_count: usize,
        skipped_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Reporter that keeps every event for later assertions
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
