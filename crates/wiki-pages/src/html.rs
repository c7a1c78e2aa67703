//! Allow-list validation of uploaded page HTML.

use std::collections::{HashMap, HashSet};

/// Tags a page may contain.
pub const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "blockquote", "br", "code", "title", "div", "em", "i", "li",
    "ol", "p", "strong", "u", "ul", "img",
];

/// Per-tag attributes a page may contain. No attribute is allowed on every
/// tag.
pub const ALLOWED_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title"]),
    ("abbr", &["title"]),
    ("acronym", &["title"]),
    ("img", &["src", "alt"]),
];

/// Sanitizes HTML against the page allow-list.
///
/// A page is valid only if sanitizing leaves it byte-for-byte unchanged, so
/// anything the sanitizer would strip, escape or re-serialize differently
/// rejects the page.
pub struct HtmlValidator {
    cleaner: ammonia::Builder<'static>,
}

impl HtmlValidator {
    pub fn new() -> Self {
        let tags: HashSet<&'static str> = ALLOWED_TAGS.iter().copied().collect();
        let attributes: HashMap<&'static str, HashSet<&'static str>> = ALLOWED_ATTRIBUTES
            .iter()
            .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
            .collect();

        let mut cleaner = ammonia::Builder::default();
        cleaner
            .tags(tags)
            .tag_attributes(attributes)
            .generic_attributes(HashSet::new())
            .link_rel(None);
        Self { cleaner }
    }

    /// The sanitized form of `html`.
    pub fn sanitize(&self, html: &str) -> String {
        self.cleaner.clean(html).to_string()
    }

    pub fn is_valid_html(&self, html: &str) -> bool {
        self.sanitize(html) == html
    }
}

impl Default for HtmlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HtmlValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlValidator")
            .field("tags", &ALLOWED_TAGS.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_markup_is_valid() {
        let v = HtmlValidator::new();
        assert!(v.is_valid_html("<p>The Water Oak grows fast.</p>"));
        assert!(v.is_valid_html("<ul><li><b>bark</b></li><li><em>leaf</em></li></ul>"));
        assert!(v.is_valid_html("just text"));
    }

    #[test]
    fn allowed_attributes_pass_without_added_rel() {
        let v = HtmlValidator::new();
        let link = r#"<a href="https://example.org/oak" title="oak">oak</a>"#;
        assert_eq!(v.sanitize(link), link);
        assert!(v.is_valid_html(r#"<img src="oak.png" alt="an oak">"#));
    }

    #[test]
    fn scripts_are_rejected() {
        let v = HtmlValidator::new();
        assert!(!v.is_valid_html("<p>hi</p><script>alert(1)</script>"));
    }

    #[test]
    fn event_handlers_and_styles_are_rejected() {
        let v = HtmlValidator::new();
        assert!(!v.is_valid_html(r#"<p onclick="steal()">hi</p>"#));
        assert!(!v.is_valid_html(r#"<div style="color: red">hi</div>"#));
        assert!(!v.is_valid_html(r#"<p class="x">hi</p>"#));
    }

    #[test]
    fn disallowed_tags_are_rejected() {
        let v = HtmlValidator::new();
        assert!(!v.is_valid_html("<h1>Oaks</h1>"));
        assert!(!v.is_valid_html("<table><tr><td>x</td></tr></table>"));
    }
}
