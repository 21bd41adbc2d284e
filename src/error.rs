use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching an archive or episode page
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode JSON page envelope from {url}: {source}")]
    InvalidEnvelope {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons an episode page cannot produce an episode
#[derive(Error, Debug)]
pub enum ExtractionFailure {
    #[error("Episode page {url} has no audio")]
    NoAudio { url: String },

    #[error("Episode page {url} has unreadable player data: {source}")]
    InvalidPlayerData {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Episode page {url} has an invalid audio URL '{audio}': {source}")]
    InvalidAudioUrl {
        url: String,
        audio: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors that can occur while resolving an audio URL to its canonical form
#[derive(Error, Debug)]
pub enum ResolutionFailure {
    #[error("Invalid audio URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to resolve {url}: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} while resolving {url}")]
    HttpStatus { url: String, status: u16 },
}

/// Errors that can occur when loading or persisting the feed document
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read feed file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse feed file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: rss::Error,
    },

    #[error("Failed to write feed file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize feed to {path}: {source}")]
    SerializeFailed {
        path: PathBuf,
        #[source]
        source: rss::Error,
    },

    #[error("Failed to replace {path} with the new feed: {source}")]
    ReplaceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read repeat list {path}: {source}")]
    RepeatListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Whether the error came from reading an existing feed rather than writing one
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            StoreError::ReadFailed { .. } | StoreError::ParseFailed { .. }
        )
    }
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Feed store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_name_the_file() {
        let err = StoreError::ReplaceFailed {
            path: PathBuf::from("/tmp/feed.xml"),
            source: std::io::Error::other("disk full"),
        };

        let message = err.to_string();
        assert!(message.contains("/tmp/feed.xml"));
        assert!(message.contains("disk full"));
    }

    #[test]
    fn load_failures_are_told_apart_from_write_failures() {
        let read = StoreError::ReadFailed {
            path: PathBuf::from("feed.xml"),
            source: std::io::Error::other("permission denied"),
        };
        let replace = StoreError::ReplaceFailed {
            path: PathBuf::from("feed.xml"),
            source: std::io::Error::other("busy"),
        };

        assert!(read.is_load_failure());
        assert!(!replace.is_load_failure());
    }

    #[test]
    fn sync_error_wraps_store_error() {
        let err: SyncError = StoreError::WriteFailed {
            path: PathBuf::from("feed.xml"),
            source: std::io::Error::other("read-only"),
        }
        .into();

        assert!(matches!(err, SyncError::Store(StoreError::WriteFailed { .. })));
    }
}
