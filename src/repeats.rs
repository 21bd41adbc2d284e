use std::collections::HashSet;
use std::path::Path;

use tracing::{info, warn};

use crate::episode::EpisodeNumber;
use crate::error::StoreError;

/// Episode numbers that are re-airs of earlier episodes
#[derive(Debug, Clone, Default)]
pub struct RepeatList {
    numbers: HashSet<EpisodeNumber>,
}

impl RepeatList {
    /// Parse one episode number per line; other lines are ignored
    pub fn parse(content: &str) -> Self {
        let numbers = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.chars().all(|c| c.is_ascii_digit()))
            .map(EpisodeNumber::new)
            .collect();

        Self { numbers }
    }

    /// Load a repeat list; a missing file is an empty list
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let list = Self::parse(&content);
                info!(path = %path.display(), count = list.len(), "loaded repeat list");
                Ok(list)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "repeat list not found, marking no repeats");
                Ok(Self::default())
            }
            Err(e) => Err(StoreError::RepeatListFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    pub fn contains(&self, number: &EpisodeNumber) -> bool {
        self.numbers.contains(number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_keeps_only_numeric_lines() {
        let list = RepeatList::parse("12\n  345 \n\n# comment\n12a\n");

        assert_eq!(list.len(), 2);
        assert!(list.contains(&EpisodeNumber::new("12")));
        assert!(list.contains(&EpisodeNumber::new("345")));
        assert!(!list.contains(&EpisodeNumber::new("12a")));
    }

    #[test]
    fn missing_file_is_empty_list() {
        let dir = tempdir().unwrap();

        let list = RepeatList::load(&dir.path().join("episodes.txt")).unwrap();

        assert!(list.is_empty());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episodes.txt");
        std::fs::write(&path, "1\n2\n").unwrap();

        let list = RepeatList::load(&path).unwrap();

        assert_eq!(list.len(), 2);
    }
}
