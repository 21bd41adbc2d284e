//! Typed accessors over parsed HTML.
//!
//! Extraction code asks questions like "the text of the first match below
//! this element" and gets an `Option` back, never a half-present node.

use scraper::{ElementRef, Selector};

/// Parse a selector known at compile time
///
/// Panics on invalid CSS, so only call this with string literals.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e}"))
}

/// Collapse whitespace runs (including non-breaking spaces) and trim
pub fn normalize_text(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first element matching `selector` under `scope`, if non-empty
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Attribute of the first element matching `selector` under `scope`
pub fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .find_map(|element| element.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Whether any ancestor of `element` satisfies `predicate`
pub fn has_ancestor(element: ElementRef<'_>, predicate: impl Fn(ElementRef<'_>) -> bool) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(predicate)
}

/// Whether `element` carries a class equal to `class`
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn normalize_text_collapses_whitespace_and_nbsp() {
        assert_eq!(normalize_text("  Act\u{a0}One:\n\t The   Heist "), "Act One: The Heist");
        assert_eq!(normalize_text(" \u{a0} "), "");
    }

    #[test]
    fn first_text_skips_empty_matches() {
        let doc = Html::parse_fragment(r#"<div><span class="x">  </span></div>"#);
        let sel = selector("span.x");

        assert_eq!(first_text(doc.root_element(), &sel), None);
    }

    #[test]
    fn first_text_joins_nested_text() {
        let doc = Html::parse_fragment(r#"<div class="body"><p>One</p><p>Two <b>three</b></p></div>"#);
        let sel = selector("div.body");

        assert_eq!(
            first_text(doc.root_element(), &sel),
            Some("One Two three".to_string())
        );
    }

    #[test]
    fn first_attr_returns_trimmed_value() {
        let doc = Html::parse_fragment(r#"<a class="next" href=" /archive?page=2 ">Next</a>"#);
        let sel = selector("a.next");

        assert_eq!(
            first_attr(doc.root_element(), &sel, "href"),
            Some("/archive?page=2".to_string())
        );
        assert_eq!(first_attr(doc.root_element(), &sel, "title"), None);
    }

    #[test]
    fn has_ancestor_checks_enclosing_elements() {
        let doc = Html::parse_fragment(
            r#"<div class="related"><div class="act" id="inner"></div></div><div class="act" id="outer"></div>"#,
        );
        let inner = doc.select(&selector("#inner")).next().unwrap();
        let outer = doc.select(&selector("#outer")).next().unwrap();

        assert!(has_ancestor(inner, |el| has_class(el, "related")));
        assert!(!has_ancestor(outer, |el| has_class(el, "related")));
    }
}
