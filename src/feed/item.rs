// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use rss::extension::itunes::ITunesItemExtension;
use rss::{Enclosure, Guid};
use url::Url;

use crate::episode::{Episode, EpisodeNumber};

pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";
pub const CLEAN_SUFFIX: &str = " (Clean)";
pub const PROMO_SUFFIX: &str = " (Promo)";
pub const REPEAT_SUFFIX: &str = " - Repeat";

const EPISODE_TYPE_FULL: &str = "full";
const CLEAN_GUID_SUFFIX: &str = "-clean";

/// Episodes only carry a calendar date; items are published at midnight UTC
const PUB_DATE_FORMAT: &str = "%a, %d %b %Y 00:00:00 +0000";

/// Which audio release an item points at
///
/// The derived ordering puts `Explicit` before `Clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Explicit,
    Clean,
}

impl Variant {
    /// Value of the `itunes:explicit` element
    pub fn explicit_flag(self) -> &'static str {
        match self {
            Variant::Explicit => "yes",
            Variant::Clean => "no",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Explicit => "explicit",
            Variant::Clean => "clean",
        }
    }
}

/// One publishable entry of the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub episode_number: EpisodeNumber,
    pub variant: Variant,
    pub title: String,
    pub link: String,
    /// RFC 822 date, absent when the air date is unknown
    pub publish_date: Option<String>,
    pub description: String,
    pub audio_url: String,
}

/// Canonical audio addresses for an episode's releases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAudio {
    pub explicit: Option<Url>,
    pub clean: Option<Url>,
}

fn push_suffix_once(title: &mut String, suffix: &str) {
    if !title.ends_with(suffix) {
        title.push_str(suffix);
    }
}

/// Build the items for an episode: explicit first, then clean
///
/// An episode without any resolved audio yields no items.
pub fn build_feed_items(episode: &Episode, audio: &ResolvedAudio, is_repeat: bool) -> Vec<FeedItem> {
    let mut base_title = episode.display_title();
    if episode.is_promo {
        push_suffix_once(&mut base_title, PROMO_SUFFIX);
    }
    if is_repeat {
        push_suffix_once(&mut base_title, REPEAT_SUFFIX);
    }

    let publish_date = episode
        .air_date
        .map(|date| date.format(PUB_DATE_FORMAT).to_string());

    [
        (Variant::Explicit, audio.explicit.as_ref()),
        (Variant::Clean, audio.clean.as_ref()),
    ]
    .into_iter()
    .filter_map(|(variant, url)| {
        let url = url?;
        let mut title = base_title.clone();
        if variant == Variant::Clean {
            push_suffix_once(&mut title, CLEAN_SUFFIX);
        }

        Some(FeedItem {
            episode_number: episode.number.clone(),
            variant,
            title,
            link: episode.url.to_string(),
            publish_date: publish_date.clone(),
            description: episode.description.clone(),
            audio_url: url.to_string(),
        })
    })
    .collect()
}

impl FeedItem {
    /// Stable identifier, distinct per variant
    pub fn guid(&self) -> String {
        match self.variant {
            Variant::Explicit => self.episode_number.to_string(),
            Variant::Clean => format!("{}{CLEAN_GUID_SUFFIX}", self.episode_number),
        }
    }

    /// Convert into an RSS item with iTunes extensions
    pub fn to_rss(&self) -> rss::Item {
        let mut enclosure = Enclosure::default();
        enclosure.set_url(self.audio_url.clone());
        enclosure.set_length("0".to_string());
        enclosure.set_mime_type(AUDIO_MIME_TYPE.to_string());

        let mut guid = Guid::default();
        guid.set_value(self.guid());
        guid.set_permalink(false);

        let mut itunes = ITunesItemExtension::default();
        itunes.set_episode(Some(self.episode_number.to_string()));
        itunes.set_episode_type(Some(EPISODE_TYPE_FULL.to_string()));
        itunes.set_explicit(Some(self.variant.explicit_flag().to_string()));

        let mut item = rss::Item::default();
        item.set_title(Some(self.title.clone()));
        item.set_link(Some(self.link.clone()));
        item.set_guid(Some(guid));
        item.set_description(Some(self.description.clone()));
        item.set_pub_date(self.publish_date.clone());
        item.set_enclosure(Some(enclosure));
        item.set_itunes_ext(Some(itunes));
        item
    }

    /// Read a stored RSS item back; `None` if it lacks audio or a number
    pub fn from_rss(item: &rss::Item) -> Option<Self> {
        let audio_url = item.enclosure()?.url().trim().to_string();
        if audio_url.is_empty() {
            return None;
        }

        let title = item.title().unwrap_or_default().to_string();
        let itunes = item.itunes_ext();

        let episode_number = itunes
            .and_then(|ext| ext.episode())
            .map(EpisodeNumber::new)
            .filter(|number| !number.is_empty())
            .or_else(|| {
                title
                    .contains(':')
                    .then(|| EpisodeNumber::split_title(&title).0)
                    .filter(|number| !number.is_empty())
            })?;

        let explicit_flag = itunes.and_then(|ext| ext.explicit()).map(str::trim);
        let clean_guid = item
            .guid()
            .is_some_and(|guid| guid.value().ends_with(CLEAN_GUID_SUFFIX));
        let variant = match explicit_flag {
            Some(flag) if flag.eq_ignore_ascii_case("no") || flag.eq_ignore_ascii_case("clean") => {
                Variant::Clean
            }
            None if clean_guid => Variant::Clean,
            _ => Variant::Explicit,
        };

        Some(FeedItem {
            episode_number,
            variant,
            title,
            link: item.link().unwrap_or_default().to_string(),
            publish_date: item.pub_date().map(String::from),
            description: item.description().unwrap_or_default().to_string(),
            audio_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_episode(number: &str, title: &str) -> Episode {
        Episode {
            number: EpisodeNumber::new(number),
            title: title.to_string(),
            url: Url::parse(&format!("https://www.thisamericanlife.org/{number}/slug")).unwrap(),
            slug: "slug".to_string(),
            air_date: NaiveDate::from_ymd_opt(2025, 3, 3),
            description: "Summary.\n\nAct One: The Heist\nBody.".to_string(),
            act_segments: Vec::new(),
            raw_audio_url: None,
            clean_audio_url: None,
            is_promo: false,
        }
    }

    fn audio(explicit: Option<&str>, clean: Option<&str>) -> ResolvedAudio {
        ResolvedAudio {
            explicit: explicit.map(|u| Url::parse(u).unwrap()),
            clean: clean.map(|u| Url::parse(u).unwrap()),
        }
    }

    #[test]
    fn builds_explicit_then_clean() {
        let episode = make_episode("901", "The Heist");
        let items = build_feed_items(
            &episode,
            &audio(
                Some("https://cdn.example.com/901.mp3"),
                Some("https://cdn.example.com/901-clean.mp3"),
            ),
            false,
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].variant, Variant::Explicit);
        assert_eq!(items[0].title, "901: The Heist");
        assert_eq!(items[0].audio_url, "https://cdn.example.com/901.mp3");
        assert_eq!(items[1].variant, Variant::Clean);
        assert_eq!(items[1].title, "901: The Heist (Clean)");
        assert_eq!(items[1].audio_url, "https://cdn.example.com/901-clean.mp3");
        assert_eq!(items[0].description, items[1].description);
        assert_eq!(items[0].publish_date.as_deref(), Some("Mon, 03 Mar 2025 00:00:00 +0000"));
    }

    #[test]
    fn no_audio_yields_no_items() {
        let episode = make_episode("901", "The Heist");

        assert!(build_feed_items(&episode, &ResolvedAudio::default(), false).is_empty());
    }

    #[test]
    fn clean_only_when_explicit_failed() {
        let episode = make_episode("901", "The Heist");
        let items = build_feed_items(
            &episode,
            &audio(None, Some("https://cdn.example.com/901-clean.mp3")),
            false,
        );

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].variant, Variant::Clean);
    }

    #[test]
    fn promo_and_repeat_suffixes_are_applied_once() {
        let mut episode = make_episode("902", "Coming Soon (Promo)");
        episode.is_promo = true;

        let items = build_feed_items(
            &episode,
            &audio(
                Some("https://cdn.example.com/promos/902.mp3"),
                Some("https://cdn.example.com/promos/902-clean.mp3"),
            ),
            true,
        );

        assert_eq!(items[0].title, "902: Coming Soon (Promo) - Repeat");
        assert_eq!(items[1].title, "902: Coming Soon (Promo) - Repeat (Clean)");
        assert_eq!(items[0].title.matches(PROMO_SUFFIX).count(), 1);
    }

    #[test]
    fn rss_item_carries_itunes_fields() {
        let episode = make_episode("901", "The Heist");
        let items = build_feed_items(
            &episode,
            &audio(
                Some("https://cdn.example.com/901.mp3"),
                Some("https://cdn.example.com/901-clean.mp3"),
            ),
            false,
        );

        let clean = items[1].to_rss();
        let itunes = clean.itunes_ext().unwrap();

        assert_eq!(itunes.episode(), Some("901"));
        assert_eq!(itunes.episode_type(), Some("full"));
        assert_eq!(itunes.explicit(), Some("no"));
        assert_eq!(clean.guid().unwrap().value(), "901-clean");
        assert_eq!(clean.enclosure().unwrap().mime_type(), AUDIO_MIME_TYPE);

        assert_eq!(FeedItem::from_rss(&clean).as_ref(), Some(&items[1]));
    }

    #[test]
    fn from_rss_falls_back_to_title_number() {
        let mut enclosure = Enclosure::default();
        enclosure.set_url("https://cdn.example.com/12.mp3".to_string());
        let mut item = rss::Item::default();
        item.set_title(Some("12: Old Episode".to_string()));
        item.set_enclosure(Some(enclosure));

        let parsed = FeedItem::from_rss(&item).unwrap();

        assert_eq!(parsed.episode_number.as_str(), "12");
        assert_eq!(parsed.variant, Variant::Explicit);
    }

    #[test]
    fn from_rss_rejects_items_without_audio_or_number() {
        let mut item = rss::Item::default();
        item.set_title(Some("13: No Audio".to_string()));
        assert!(FeedItem::from_rss(&item).is_none());

        let mut enclosure = Enclosure::default();
        enclosure.set_url("https://cdn.example.com/x.mp3".to_string());
        let mut item = rss::Item::default();
        item.set_title(Some("Untitled".to_string()));
        item.set_enclosure(Some(enclosure));
        assert!(FeedItem::from_rss(&item).is_none());
    }
}
