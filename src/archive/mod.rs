mod listing;
mod paginate;

pub use listing::{ArchivePage, EpisodeRef, parse_archive_page, read_listing};
pub use paginate::{ArchivePaginator, PageLimits};
