mod document;
mod item;

pub use document::{default_channel, partial_path, read_channel, write_channel};
pub use item::{
    AUDIO_MIME_TYPE, CLEAN_SUFFIX, FeedItem, PROMO_SUFFIX, REPEAT_SUFFIX, ResolvedAudio, Variant,
    build_feed_items,
};
