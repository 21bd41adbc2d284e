pub mod archive;
pub mod episode;
pub mod error;
pub mod feed;
pub mod html;
pub mod http;
pub mod progress;
pub mod repeats;
pub mod state;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use archive::{ArchivePaginator, EpisodeRef, PageLimits};
pub use episode::{Episode, EpisodeNumber, canonicalize, extract_episode};
pub use error::{ExtractionFailure, FetchError, ResolutionFailure, StoreError, SyncError};
pub use feed::{FeedItem, Variant, build_feed_items};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use repeats::RepeatList;
pub use state::FeedState;
pub use sync::{CancelFlag, SyncMode, SyncOptions, SyncReport, TEST_EPISODE_LIMIT, sync_feed};
