// src/presentation.rs
//
// Presentation pass over a sanitized document.
//
// Runs strictly after the sanitizer and only ever adds values the policy accepts:
// remote image sources become a fixed inert placeholder plus a `data-blocked`
// marker (CSS `url()` loads are stripped instead), links can be forced into a new browsing context, and the whole document is
// wrapped in a root container styled from a fixed per-theme string.

use crate::charref::decode_char_refs;
use crate::css;
use crate::error::Error;
use crate::policy::Policy;
use crate::sanitizer::{serialize, SanitizedDocument};
use crate::tokenizer::{Tag, Token};
use crate::url::{self, UrlKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Replacement for blocked image sources.
pub const BLOCKED_IMAGE_PLACEHOLDER: &str = "cid:blocked-image";

/// Marker attribute on elements whose image source was blocked.
pub const BLOCKED_MARKER: &str = "data-blocked";

const LIGHT_STYLE: &str = "background-color:#ffffff;color:#1f1f1f";
const DARK_STYLE: &str = "background-color:#1e1e1e;color:#e8e8e8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Declarations applied to the root container.
    pub fn style(self) -> &'static str {
        match self {
            Theme::Light => LIGHT_STYLE,
            Theme::Dark => DARK_STYLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::InvalidTheme(other.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Preferences {
    pub theme: Theme,
    pub should_load_images: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationResult {
    pub processed_html: String,
    pub has_blocked_images: bool,
}

/// Operator settings for the presentation pass (the `[presentation]` config section).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Give every link `target="_blank"` and `rel="noopener noreferrer"`.
    pub force_link_targets: bool,
    /// Value written into blocked `src`/`background` attributes.
    pub blocked_image_placeholder: String,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            force_link_targets: true,
            blocked_image_placeholder: BLOCKED_IMAGE_PLACEHOLDER.to_string(),
        }
    }
}

struct Presenter<'a> {
    policy: &'a Policy,
    config: &'a PresentationConfig,
    prefs: Preferences,
    blocked: usize,
}

pub fn apply_preferences(
    doc: &SanitizedDocument,
    policy: &Policy,
    config: &PresentationConfig,
    prefs: Preferences,
) -> PresentationResult {
    let mut p = Presenter {
        policy,
        config,
        prefs,
        blocked: 0,
    };

    let mut tokens = Vec::with_capacity(doc.tokens().len() + 2);
    tokens.push(Token::Open(root_container(prefs.theme)));
    let mut in_style = false;
    for tok in doc.tokens() {
        let tok = match tok {
            Token::Open(tag) => {
                in_style = tag.name == "style";
                Token::Open(p.tag(tag))
            }
            Token::SelfClosing(tag) => Token::SelfClosing(p.tag(tag)),
            Token::Text(text) if in_style && !prefs.should_load_images => {
                match p.style_sheet(text) {
                    Some(text) => Token::Text(text),
                    None => continue,
                }
            }
            other => {
                in_style = false;
                other.clone()
            }
        };
        tokens.push(tok);
    }
    tokens.push(Token::Close("div".to_string()));

    let mut processed_html = String::new();
    serialize(&tokens, &mut processed_html);

    tracing::debug!(
        theme = %prefs.theme,
        blocked_images = p.blocked,
        "applied presentation preferences"
    );
    PresentationResult {
        processed_html,
        has_blocked_images: p.blocked > 0,
    }
}

/// A load source present on the tag that is not an embedded `cid:` part.
fn loads_remotely(value: Option<&str>) -> bool {
    match value {
        Some(v) => !matches!(url::classify(v), UrlKind::Absolute(ref s) if s == "cid"),
        None => false,
    }
}

/// Remove the declarations of a `style` attribute that fetch remote images.
/// Returns whether anything was removed.
fn block_style_urls(tag: &mut Tag) -> bool {
    let Some(style) = tag.attr("style").map(str::to_owned) else {
        return false;
    };
    if !css::has_remote_url(&decode_char_refs(&style)) {
        return false;
    }
    let kept = css::strip_remote_urls(&style, ';');
    let decoded = decode_char_refs(&kept);
    if kept.trim().is_empty() || css::has_remote_url(&decoded) || css::has_active_content(&decoded) {
        tag.remove_attr("style");
    } else {
        tag.set_attr("style", kept);
    }
    true
}

fn root_container(theme: Theme) -> Tag {
    let mut root = Tag::new("div");
    root.set_attr("style", theme.style());
    root
}

impl Presenter<'_> {
    fn tag(&mut self, tag: &Tag) -> Tag {
        let mut tag = tag.clone();
        if !self.prefs.should_load_images {
            self.block_images(&mut tag);
        }
        if self.config.force_link_targets && tag.name == "a" && tag.has_attr("href") {
            self.set_if_allowed(&mut tag, "target", "_blank");
            self.set_if_allowed(&mut tag, "rel", "noopener noreferrer");
        }
        tag
    }

    fn block_images(&mut self, tag: &mut Tag) {
        let mut neutralized = false;
        if tag.name == "img" && loads_remotely(tag.attr("src")) {
            self.neutralize(tag, "src");
            neutralized = true;
        }
        if loads_remotely(tag.attr("background")) {
            self.neutralize(tag, "background");
            neutralized = true;
        }
        if block_style_urls(tag) {
            neutralized = true;
        }
        if neutralized {
            self.blocked += 1;
            self.set_if_allowed(tag, BLOCKED_MARKER, "true");
        }
    }

    /// Body of a `<style>` element with image blocking on. `None` drops it.
    fn style_sheet(&mut self, text: &str) -> Option<String> {
        if !css::has_remote_url(text) {
            return Some(text.to_string());
        }
        self.blocked += 1;
        let kept = css::strip_remote_urls(text, '}');
        (!kept.is_empty()).then_some(kept)
    }

    /// Point a load source at the placeholder, or remove it if the policy would reject
    /// the placeholder.
    fn neutralize(&self, tag: &mut Tag, attr: &str) {
        let placeholder = &self.config.blocked_image_placeholder;
        if self.policy.allows_url(placeholder) {
            tag.set_attr(attr, placeholder.as_str());
        } else {
            tag.remove_attr(attr);
        }
    }

    fn set_if_allowed(&self, tag: &mut Tag, attr: &str, value: &str) {
        if self.policy.allows_attribute(&tag.name, attr) {
            tag.set_attr(attr, value);
        }
    }
}
