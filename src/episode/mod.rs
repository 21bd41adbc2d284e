mod audio;
mod describe;
mod extract;
mod number;

pub use audio::{canonicalize, strip_query};
pub use describe::{ActSegment, assemble_description, compose_label};
pub use extract::{Episode, PROMO_MARKER, extract_episode, is_promo_url, parse_air_date};
pub use number::EpisodeNumber;
