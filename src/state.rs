use std::collections::HashSet;
use std::path::Path;

use rss::Channel;
use tracing::{info, warn};

use crate::episode::EpisodeNumber;
use crate::error::StoreError;
use crate::feed::{FeedItem, Variant, default_channel, read_channel, write_channel};
use crate::sync::SyncMode;

const BUILT_IN_SEED: &str = "built-in seed";

/// The feed being built: channel metadata plus its items
#[derive(Debug, Clone)]
pub struct FeedState {
    /// Channel metadata, always without items
    channel: Channel,
    items: Vec<FeedItem>,
    /// Where the state was loaded from, for reporting
    source: String,
}

/// What a merge did with the offered items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Items added to the feed
    pub added: usize,
    /// Items skipped because their episode was already in the feed
    pub already_known: usize,
    /// Items skipped because the same episode and variant was already merged
    pub duplicates: usize,
}

impl FeedState {
    /// Build a state from a channel, optionally keeping its items
    ///
    /// Stored items without audio or episode number are dropped, as is any
    /// repeated `(episode, variant)` pair.
    pub fn from_channel(mut channel: Channel, keep_items: bool, source: impl Into<String>) -> Self {
        let stored = channel.items().to_vec();
        channel.set_items(Vec::<rss::Item>::new());
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        if keep_items {
            for item in &stored {
                match FeedItem::from_rss(item) {
                    Some(feed_item) => {
                        if seen.insert((feed_item.episode_number.clone(), feed_item.variant)) {
                            items.push(feed_item);
                        }
                    }
                    None => {
                        warn!(
                            title = item.title().unwrap_or_default(),
                            "dropping stored item without audio or episode number"
                        );
                    }
                }
            }
        }

        Self {
            channel,
            items,
            source: source.into(),
        }
    }

    /// Seed state: channel metadata from `seed` (or the built-in channel), no items
    pub fn seed(seed: Option<&Path>) -> Result<Self, StoreError> {
        match seed {
            Some(path) => Ok(Self::from_channel(
                read_channel(path)?,
                false,
                path.display().to_string(),
            )),
            None => Ok(Self::from_channel(default_channel(), false, BUILT_IN_SEED)),
        }
    }

    /// Load the starting state for a run
    ///
    /// Incremental runs continue from the previous output when it exists;
    /// every other mode rebuilds from the seed. A previous output that
    /// exists but cannot be read is an error, never silently replaced.
    pub fn load(mode: &SyncMode, seed: Option<&Path>, output: &Path) -> Result<Self, StoreError> {
        let state = if mode.continues_previous() && output.exists() {
            Self::from_channel(read_channel(output)?, true, output.display().to_string())
        } else {
            Self::seed(seed)?
        };

        info!(
            source = %state.source,
            items = state.items.len(),
            "loaded feed state"
        );

        Ok(state)
    }

    /// Episode numbers already present in the feed
    pub fn known_numbers(&self) -> HashSet<EpisodeNumber> {
        self.items
            .iter()
            .map(|item| item.episode_number.clone())
            .collect()
    }

    /// Merge new items and restore the feed ordering
    pub fn merge(&mut self, items: Vec<FeedItem>, mode: &SyncMode) -> MergeOutcome {
        let known = if mode.continues_previous() {
            self.known_numbers()
        } else {
            HashSet::new()
        };

        let mut seen: HashSet<(EpisodeNumber, Variant)> = self
            .items
            .iter()
            .map(|item| (item.episode_number.clone(), item.variant))
            .collect();

        let mut outcome = MergeOutcome::default();

        for item in items {
            if known.contains(&item.episode_number) {
                outcome.already_known += 1;
                continue;
            }

            if !seen.insert((item.episode_number.clone(), item.variant)) {
                outcome.duplicates += 1;
                continue;
            }

            self.items.push(item);
            outcome.added += 1;
        }

        self.sort();
        outcome
    }

    /// Newest episode first; explicit release before its clean sibling
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            b.episode_number
                .cmp(&a.episode_number)
                .then(a.variant.cmp(&b.variant))
        });
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The full feed document
    pub fn to_channel(&self) -> Channel {
        let mut channel = self.channel.clone();
        channel.set_items(self.items.iter().map(FeedItem::to_rss).collect::<Vec<_>>());
        channel
    }

    /// Write the feed atomically to `path`
    pub fn persist(&self, path: &Path) -> Result<(), StoreError> {
        write_channel(&self.to_channel(), path)?;
        info!(path = %path.display(), items = self.items.len(), "persisted feed");
        Ok(())
    }
}
