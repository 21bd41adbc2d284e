// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use crate::http::{HttpClient, fetch_page};
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::listing::{EpisodeRef, read_listing};

/// How far the paginator may walk the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Maximum number of listing pages to fetch (None = all)
    pub max_pages: Option<usize>,
    /// Follow "next page" links at all
    pub follow_next: bool,
}

impl PageLimits {
    pub const UNBOUNDED: Self = Self {
        max_pages: None,
        follow_next: true,
    };

    pub const FIRST_PAGE_ONLY: Self = Self {
        max_pages: Some(1),
        follow_next: false,
    };
}

/// Lazily walks the archive, yielding episode links one at a time
///
/// A listing page is only fetched once the links of the previous page are
/// used up. A page that cannot be fetched or parsed ends the traversal;
/// links already buffered are still handed out.
pub struct ArchivePaginator<'a, C: HttpClient + ?Sized> {
    client: &'a C,
    next_page: Option<Url>,
    pending: VecDeque<EpisodeRef>,
    visited: HashSet<Url>,
    pages_fetched: usize,
    limits: PageLimits,
    delay: Duration,
    reporter: SharedProgressReporter,
}

impl<'a, C: HttpClient + ?Sized> ArchivePaginator<'a, C> {
    pub fn new(
        client: &'a C,
        start: Url,
        limits: PageLimits,
        delay: Duration,
        reporter: SharedProgressReporter,
    ) -> Self {
        Self {
            client,
            next_page: Some(start),
            pending: VecDeque::new(),
            visited: HashSet::new(),
            pages_fetched: 0,
            limits,
            delay,
            reporter,
        }
    }

    /// Number of listing pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Next episode link, fetching further pages as needed
    pub async fn next_reference(&mut self) -> Option<EpisodeRef> {
        loop {
            if let Some(reference) = self.pending.pop_front() {
                return Some(reference);
            }

            let references = self.next_page().await?;
            self.pending.extend(references);
        }
    }

    /// Fetch the next listing page and return its episode links
    ///
    /// Returns `None` once traversal is over.
    #[instrument(level = "info", skip(self), fields(page = self.pages_fetched + 1))]
    pub async fn next_page(&mut self) -> Option<Vec<EpisodeRef>> {
        let url = self.next_page.take()?;

        if self
            .limits
            .max_pages
            .is_some_and(|max| self.pages_fetched >= max)
        {
            return None;
        }

        if !self.visited.insert(url.clone()) {
            warn!(%url, "archive pager points back to a visited page");
            return None;
        }

        if self.pages_fetched > 0 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.pages_fetched += 1;
        self.reporter.report(ProgressEvent::FetchingArchivePage {
            url: url.to_string(),
            page_number: self.pages_fetched,
        });

        let listing = match fetch_page(self.client, url.as_str()).await {
            Ok(page) => read_listing(&page),
            Err(e) => Err(e),
        };

        let page = match listing {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "archive page unavailable, ending traversal");
                self.reporter.report(ProgressEvent::ArchivePageFailed {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                return None;
            }
        };

        info!(
            %url,
            references = page.references.len(),
            has_next = page.next_page.is_some(),
            "parsed archive page"
        );

        self.reporter.report(ProgressEvent::ArchivePageParsed {
            url: url.to_string(),
            references: page.references.len(),
            has_next: page.next_page.is_some(),
        });

        if self.limits.follow_next {
            self.next_page = page.next_page;
        }

        Some(page.references)
    }
}
