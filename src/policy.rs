// src/policy.rs
//
// Allow-list policy: which tags, attributes and URL schemes survive sanitization.
//
// A `Policy` is built once (usually [`Policy::email`]) and then only read, so a single
// value can be shared by reference across any number of concurrent sanitize calls.
// Everything not listed is denied.

use crate::url::{self, UrlKind};
use std::collections::{HashMap, HashSet};

/// Attributes treated as URLs on every tag.
pub const URL_ATTRIBUTES: &[&str] = &["src", "href", "action", "background", "poster"];

/// Schemes allowed in URL attributes. Relative references are always allowed.
pub const SCHEMES: &[&str] = &["http", "https", "mailto", "cid"];

/// Attributes allowed on every allowed tag.
const GLOBAL_ATTRIBUTES: &[&str] = &["align", "class", "dir", "id", "lang", "style", "title"];

/// Tags whose body is removed together with the tag.
const DROP_CONTENT: &[&str] = &[
    "applet", "embed", "frame", "frameset", "iframe", "math", "noembed", "noframes",
    "noscript", "object", "script", "select", "svg", "template", "textarea", "title",
];

/// Allowed tags and their tag-specific attributes.
const EMAIL_TAGS: &[(&str, &[&str])] = &[
    ("a", &["href", "name", "target", "rel"]),
    ("abbr", &[]),
    ("address", &[]),
    ("article", &[]),
    ("aside", &[]),
    ("b", &[]),
    ("bdi", &[]),
    ("bdo", &[]),
    ("big", &[]),
    ("blockquote", &["type"]),
    ("br", &["clear"]),
    ("caption", &[]),
    ("center", &[]),
    ("cite", &[]),
    ("code", &[]),
    ("col", &["span", "width", "valign"]),
    ("colgroup", &["span", "width", "valign"]),
    ("dd", &[]),
    ("del", &["datetime"]),
    ("details", &["open"]),
    ("dfn", &[]),
    ("div", &[]),
    ("dl", &[]),
    ("dt", &[]),
    ("em", &[]),
    ("figcaption", &[]),
    ("figure", &[]),
    ("font", &["color", "face", "size"]),
    ("footer", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("header", &[]),
    ("hr", &["color", "noshade", "size", "width"]),
    ("i", &[]),
    (
        "img",
        &[
            "alt", "border", "data-blocked", "height", "hspace", "src", "vspace", "width",
        ],
    ),
    ("ins", &["datetime"]),
    ("kbd", &[]),
    ("li", &["type", "value"]),
    ("main", &[]),
    ("mark", &[]),
    ("nav", &[]),
    ("ol", &["reversed", "start", "type"]),
    ("p", &[]),
    ("pre", &[]),
    ("q", &[]),
    ("s", &[]),
    ("samp", &[]),
    ("section", &[]),
    ("small", &[]),
    ("span", &[]),
    ("strike", &[]),
    ("strong", &[]),
    ("style", &["media", "type"]),
    ("sub", &[]),
    ("summary", &[]),
    ("sup", &[]),
    (
        "table",
        &[
            "background", "bgcolor", "border", "cellpadding", "cellspacing", "data-blocked",
            "height", "summary", "width",
        ],
    ),
    ("tbody", &["bgcolor", "valign"]),
    (
        "td",
        &[
            "abbr", "background", "bgcolor", "colspan", "data-blocked", "height", "nowrap",
            "rowspan", "valign", "width",
        ],
    ),
    ("tfoot", &["bgcolor", "valign"]),
    (
        "th",
        &[
            "abbr", "background", "bgcolor", "colspan", "data-blocked", "height", "nowrap",
            "rowspan", "scope", "valign", "width",
        ],
    ),
    ("thead", &["bgcolor", "valign"]),
    ("time", &["datetime"]),
    ("tr", &["background", "bgcolor", "data-blocked", "height", "valign"]),
    ("tt", &[]),
    ("u", &[]),
    ("ul", &["type"]),
    ("var", &[]),
    ("wbr", &[]),
];

/// `on*` attributes are never allowed, whatever the allow-list says.
pub fn is_event_handler(attr: &str) -> bool {
    attr.len() >= 2 && attr.as_bytes()[..2].eq_ignore_ascii_case(b"on")
}

#[derive(Debug, Clone, Default)]
pub struct Policy {
    tags: HashMap<String, HashSet<String>>,
    global_attributes: HashSet<String>,
    url_attributes: HashSet<String>,
    schemes: HashSet<String>,
    drop_content: HashSet<String>,
}

impl Policy {
    /// An empty policy: denies every tag. Extend it with the builder methods.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder {
            policy: Policy::default(),
        }
    }

    /// The policy for rendering third-party mail bodies.
    pub fn email() -> Self {
        let mut b = Policy::builder()
            .global_attributes(GLOBAL_ATTRIBUTES)
            .url_attributes(URL_ATTRIBUTES)
            .schemes(SCHEMES)
            .drop_content(DROP_CONTENT);
        for (tag, attrs) in EMAIL_TAGS {
            b = b.tag(tag, attrs);
        }
        b.build()
    }

    /// Reopen this policy for extension.
    pub fn into_builder(self) -> PolicyBuilder {
        PolicyBuilder { policy: self }
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn allows_attribute(&self, tag: &str, attr: &str) -> bool {
        if is_event_handler(attr) {
            return false;
        }
        match self.tags.get(tag) {
            Some(attrs) => attrs.contains(attr) || self.global_attributes.contains(attr),
            None => false,
        }
    }

    pub fn is_url_attribute(&self, attr: &str) -> bool {
        self.url_attributes.contains(attr)
    }

    pub fn allows_scheme(&self, scheme: &str) -> bool {
        self.schemes.contains(scheme)
    }

    /// Whether a URL attribute with this raw value may be kept.
    pub fn allows_url(&self, value: &str) -> bool {
        match url::classify(value) {
            UrlKind::Relative => true,
            UrlKind::Absolute(scheme) => self.allows_scheme(&scheme),
            UrlKind::Malformed => false,
        }
    }

    pub fn drops_content(&self, tag: &str) -> bool {
        self.drop_content.contains(tag)
    }
}

#[derive(Debug, Clone)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    /// Allow `tag` with the given tag-specific attributes (added to any already allowed).
    pub fn tag(mut self, tag: &str, attrs: &[&str]) -> Self {
        let entry = self.policy.tags.entry(tag.to_ascii_lowercase()).or_default();
        entry.extend(attrs.iter().map(|a| a.to_ascii_lowercase()));
        self
    }

    pub fn global_attributes(mut self, attrs: &[&str]) -> Self {
        self.policy
            .global_attributes
            .extend(attrs.iter().map(|a| a.to_ascii_lowercase()));
        self
    }

    pub fn url_attributes(mut self, attrs: &[&str]) -> Self {
        self.policy
            .url_attributes
            .extend(attrs.iter().map(|a| a.to_ascii_lowercase()));
        self
    }

    pub fn schemes<S: AsRef<str>>(mut self, schemes: &[S]) -> Self {
        self.policy
            .schemes
            .extend(schemes.iter().map(|s| s.as_ref().to_ascii_lowercase()));
        self
    }

    /// Disallowed tags listed here lose their body too, not just the tag.
    pub fn drop_content<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.policy
            .drop_content
            .extend(tags.iter().map(|t| t.as_ref().to_ascii_lowercase()));
        self
    }

    pub fn build(self) -> Policy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_policy_basics() {
        let p = Policy::email();
        assert!(p.allows_tag("div"));
        assert!(p.allows_tag("img"));
        assert!(!p.allows_tag("script"));
        assert!(!p.allows_tag("iframe"));
        assert!(!p.allows_tag("form"));
        assert!(p.drops_content("script"));
        assert!(p.drops_content("iframe"));
        assert!(!p.drops_content("form"));
    }

    #[test]
    fn attributes_per_tag_and_global() {
        let p = Policy::email();
        assert!(p.allows_attribute("a", "href"));
        assert!(!p.allows_attribute("div", "href"));
        assert!(p.allows_attribute("div", "style"));
        assert!(p.allows_attribute("img", "data-blocked"));
        assert!(!p.allows_attribute("img", "srcset"));
        assert!(!p.allows_attribute("blink", "class"));
    }

    #[test]
    fn event_handlers_are_never_allowed() {
        let p = Policy::builder()
            .tag("img", &["src", "onerror"])
            .global_attributes(&["onclick"])
            .build();
        assert!(p.allows_attribute("img", "src"));
        assert!(!p.allows_attribute("img", "onerror"));
        assert!(!p.allows_attribute("img", "onclick"));
        assert!(is_event_handler("ONLOAD"));
        assert!(!is_event_handler("o"));
    }

    #[test]
    fn url_schemes() {
        let p = Policy::email();
        assert!(p.allows_url("https://example.com/a.png"));
        assert!(p.allows_url("mailto:someone@example.com"));
        assert!(p.allows_url("cid:logo@mail"));
        assert!(p.allows_url("relative/path.html"));
        assert!(!p.allows_url("javascript:alert(1)"));
        assert!(!p.allows_url("data:text/html,<script>x</script>"));
        assert!(!p.allows_url("vbscript:x"));
        assert!(!p.allows_url("java&unknown;script:x"));
    }

    #[test]
    fn builder_extends_existing_policy() {
        let p = Policy::email()
            .into_builder()
            .tag("MARQUEE", &["Behavior"])
            .schemes(&["tel"])
            .build();
        assert!(p.allows_tag("marquee"));
        assert!(p.allows_attribute("marquee", "behavior"));
        assert!(p.allows_url("tel:+15551234"));
        assert!(p.allows_tag("div"));
    }

    #[test]
    fn empty_policy_denies_everything() {
        let p = Policy::builder().build();
        assert!(!p.allows_tag("p"));
        assert!(!p.allows_url("https://x"));
        assert!(p.allows_url("x.html"));
    }
}
