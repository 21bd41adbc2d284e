use std::cmp::Ordering;
use std::fmt;

/// Episode identifier as printed before the title separator
///
/// Integer-like numbers compare numerically, so `1000` sorts above `999`.
/// Non-numeric identifiers sort below every numeric one and compare
/// lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeNumber(String);

impl EpisodeNumber {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Split a player title like `"901: The Heist"` into number and title.
    ///
    /// Without a separator the whole trimmed title is the number.
    pub fn split_title(title: &str) -> (Self, Option<String>) {
        match title.split_once(':') {
            Some((number, rest)) => {
                let rest = rest.trim();
                (Self::new(number), (!rest.is_empty()).then(|| rest.to_string()))
            }
            None => (Self::new(title), None),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for EpisodeNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for EpisodeNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_title_on_first_separator() {
        let (number, title) = EpisodeNumber::split_title("901: The Heist: Part Two");
        assert_eq!(number.as_str(), "901");
        assert_eq!(title.as_deref(), Some("The Heist: Part Two"));
    }

    #[test]
    fn split_title_without_separator_uses_whole_title() {
        let (number, title) = EpisodeNumber::split_title("  Special Broadcast ");
        assert_eq!(number.as_str(), "Special Broadcast");
        assert!(title.is_none());
    }

    #[test]
    fn numbers_compare_numerically() {
        assert!(EpisodeNumber::new("1000") > EpisodeNumber::new("999"));
        assert!(EpisodeNumber::new("90") < EpisodeNumber::new("900"));
    }

    #[test]
    fn non_numeric_sorts_below_numeric() {
        assert!(EpisodeNumber::new("1") > EpisodeNumber::new("Special"));
        assert!(EpisodeNumber::new("b") > EpisodeNumber::new("a"));
    }

    #[test]
    fn ordering_is_consistent_with_equality() {
        let a = EpisodeNumber::new("07");
        let b = EpisodeNumber::new("7");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }
}
