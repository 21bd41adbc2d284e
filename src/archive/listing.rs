use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::error::FetchError;
use crate::html::{element_text, first_attr, selector};
use crate::http::FetchedPage;

static EPISODE_LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.goto-episode[href]"));
static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| selector("a.pager[href]"));

/// A link from the archive to an episode detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub url: Url,
    /// Link text, usually `"901: The Heist"`
    pub title: Option<String>,
}

/// One parsed archive listing page
#[derive(Debug, Clone, Default)]
pub struct ArchivePage {
    /// Episode links in document order
    pub references: Vec<EpisodeRef>,
    pub next_page: Option<Url>,
}

/// The archive's AJAX pager answers with the listing wrapped in JSON
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    html: String,
}

/// Parse an archive listing page's HTML
pub fn parse_archive_page(html: &str, page_url: &Url) -> ArchivePage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let references = root
        .select(&EPISODE_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?.trim();
            let url = page_url.join(href).ok()?;
            let title = Some(element_text(link)).filter(|t| !t.is_empty());
            Some(EpisodeRef { url, title })
        })
        .collect();

    let next_page = first_attr(root, &NEXT_PAGE, "href").and_then(|href| page_url.join(&href).ok());

    ArchivePage {
        references,
        next_page,
    }
}

/// Parse a fetched listing, unwrapping JSON envelopes
pub fn read_listing(page: &FetchedPage) -> Result<ArchivePage, FetchError> {
    let page_url = Url::parse(&page.final_url)?;

    if page.is_json() {
        let envelope: PageEnvelope =
            serde_json::from_str(&page.body).map_err(|e| FetchError::InvalidEnvelope {
                url: page.final_url.clone(),
                source: e,
            })?;
        return Ok(parse_archive_page(&envelope.html, &page_url));
    }

    Ok(parse_archive_page(&page.body, &page_url))
}
