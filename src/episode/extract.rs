// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::error::ExtractionFailure;
use crate::html::{element_text, first_text, has_ancestor, has_class, selector};

use super::describe::{ActSegment, assemble_description};
use super::number::EpisodeNumber;

/// Audio paths containing this segment belong to promotional episodes
pub const PROMO_MARKER: &str = "/promos/";

/// Link targets containing this word point at the content-filtered release
const CLEAN_MARKER: &str = "clean";

/// File extensions accepted for a clean download link without a `download` attribute
const AUDIO_EXTENSIONS: [&str; 4] = [".mp3", ".m4a", ".aac", ".ogg"];

/// Air dates are printed like "March 3, 2025"
const AIR_DATE_FORMAT: &str = "%B %d, %Y";

static PLAYER_DATA: LazyLock<Selector> = LazyLock::new(|| selector("script#playlist-data"));
static AIR_DATE: LazyLock<Selector> = LazyLock::new(|| selector("span.date-display-single"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector(".field-name-body"));
static ACT: LazyLock<Selector> = LazyLock::new(|| selector(".act"));
static ACT_LABEL: LazyLock<Selector> =
    LazyLock::new(|| selector(".field-name-field-act-label"));
static ACT_HEADER: LazyLock<Selector> = LazyLock::new(|| selector(".act-header"));
static FIELD_ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".field-item"));
static DOWNLOAD_LINK: LazyLock<Selector> = LazyLock::new(|| {
    selector("a.links-processed[href], a.internal[href], a[download][href]")
});

/// Represents one episode scraped from its detail page
#[derive(Debug, Clone)]
pub struct Episode {
    pub number: EpisodeNumber,
    /// Title without the number prefix
    pub title: String,
    pub url: Url,
    pub slug: String,
    pub air_date: Option<NaiveDate>,
    pub description: String,
    pub act_segments: Vec<ActSegment>,
    pub raw_audio_url: Option<Url>,
    pub clean_audio_url: Option<Url>,
    pub is_promo: bool,
}

impl Episode {
    /// Title as shown in the feed, e.g. `"901: The Heist"`
    pub fn display_title(&self) -> String {
        if self.title.is_empty() || self.title == self.number.as_str() {
            self.number.to_string()
        } else {
            format!("{}: {}", self.number, self.title)
        }
    }

    /// Re-evaluate the promo flag against a resolved audio URL
    pub fn mark_promo_from(&mut self, audio: &Url) {
        self.is_promo |= is_promo_url(audio);
    }
}

/// Whether an audio URL points at promotional content
pub fn is_promo_url(url: &Url) -> bool {
    url.path().contains(PROMO_MARKER)
}

/// The embedded `playlist-data` block
#[derive(Debug, Deserialize)]
struct PlayerData {
    title: Option<String>,
    audio: Option<String>,
}

/// Parse a printed air date; format mismatches yield `None`
pub fn parse_air_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), AIR_DATE_FORMAT).ok()
}

/// Extract an episode from its detail page
///
/// `title_hint` is the link text from the archive listing, used when the
/// player data carries no usable title. Only missing or unusable audio
/// fails the extraction; every other missing element degrades its field.
pub fn extract_episode(
    html: &str,
    page_url: &Url,
    title_hint: Option<&str>,
) -> Result<Episode, ExtractionFailure> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let player = read_player_data(root, page_url)?;

    let audio = player
        .audio
        .as_deref()
        .map(str::trim)
        .filter(|audio| !audio.is_empty())
        .ok_or_else(|| ExtractionFailure::NoAudio {
            url: page_url.to_string(),
        })?;

    let raw_audio_url = page_url
        .join(audio)
        .map_err(|e| ExtractionFailure::InvalidAudioUrl {
            url: page_url.to_string(),
            audio: audio.to_string(),
            source: e,
        })?;

    let slug = page_slug(page_url);
    let (number, title) = number_and_title(player.title.as_deref(), title_hint, &slug);

    let act_segments = extract_acts(root);
    let summary = extract_summary(root);
    let description = assemble_description(summary.as_deref(), &act_segments);

    let air_date = first_text(root, &AIR_DATE).and_then(|text| parse_air_date(&text));
    let clean_audio_url = find_clean_link(root, page_url);
    let is_promo = is_promo_url(&raw_audio_url);

    Ok(Episode {
        number,
        title,
        url: page_url.clone(),
        slug,
        air_date,
        description,
        act_segments,
        raw_audio_url: Some(raw_audio_url),
        clean_audio_url,
        is_promo,
    })
}

fn read_player_data(root: ElementRef<'_>, page_url: &Url) -> Result<PlayerData, ExtractionFailure> {
    let script = root
        .select(&PLAYER_DATA)
        .next()
        .ok_or_else(|| ExtractionFailure::NoAudio {
            url: page_url.to_string(),
        })?;

    let json: String = script.text().collect();

    serde_json::from_str(&json).map_err(|e| ExtractionFailure::InvalidPlayerData {
        url: page_url.to_string(),
        source: e,
    })
}

fn number_and_title(
    player_title: Option<&str>,
    title_hint: Option<&str>,
    slug: &str,
) -> (EpisodeNumber, String) {
    let player_title = player_title.map(str::trim).filter(|t| !t.is_empty());
    let hint = title_hint.map(str::trim).filter(|t| !t.is_empty());

    let Some(source) = player_title.or(hint) else {
        return (EpisodeNumber::new(slug), slug.to_string());
    };

    let (number, title) = EpisodeNumber::split_title(source);
    let title = title
        .or_else(|| hint.and_then(|h| EpisodeNumber::split_title(h).1))
        .unwrap_or_else(|| source.to_string());

    (number, title)
}

fn page_slug(page_url: &Url) -> String {
    page_url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .unwrap_or_default()
        .to_string()
}

fn is_act(element: ElementRef<'_>) -> bool {
    has_class(element, "act")
}

fn is_related(element: ElementRef<'_>) -> bool {
    element.value().id() == Some("related")
        || element.value().classes().any(|c| c.contains("related"))
}

fn extract_summary(root: ElementRef<'_>) -> Option<String> {
    root.select(&BODY)
        .find(|body| !has_ancestor(*body, is_act))
        .map(element_text)
        .filter(|text| !text.is_empty())
}

fn extract_acts(root: ElementRef<'_>) -> Vec<ActSegment> {
    root.select(&ACT)
        .filter(|act| !has_ancestor(*act, is_related))
        .filter_map(|act| {
            ActSegment::from_parts(
                first_text(act, &ACT_LABEL).as_deref(),
                act_title(act).as_deref(),
                first_text(act, &BODY).as_deref(),
            )
        })
        .collect()
}

/// Title of an act: the header's own field item, not the label nested in it
fn act_title(act: ElementRef<'_>) -> Option<String> {
    let header = act.select(&ACT_HEADER).next()?;
    let is_label = |element: ElementRef<'_>| has_class(element, "field-name-field-act-label");

    match header
        .select(&FIELD_ITEM)
        .find(|item| !has_ancestor(*item, is_label))
    {
        Some(item) => Some(element_text(item)).filter(|text| !text.is_empty()),
        None if header.select(&FIELD_ITEM).next().is_some() => None,
        None => Some(element_text(header)).filter(|text| !text.is_empty()),
    }
}

fn is_audio_path(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// First download link in the episode's own content pointing at clean audio
///
/// Only download-style links count, and only when they carry a `download`
/// attribute or end in an audio file extension. Links to web pages, such as
/// an episode slug containing the marker, never qualify.
fn find_clean_link(root: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    root.select(&DOWNLOAD_LINK)
        .filter(|link| !has_ancestor(*link, is_related))
        .find_map(|link| {
            let href = link.value().attr("href")?.trim();
            if !href.to_ascii_lowercase().contains(CLEAN_MARKER) {
                return None;
            }

            let url = page_url.join(href).ok()?;
            let is_download = link.value().attr("download").is_some();
            (is_download || is_audio_path(&url)).then_some(url)
        })
}
