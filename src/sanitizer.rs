// src/sanitizer.rs
//
// Allow-list sanitizer over the token stream.
//
// - Tags outside the policy are dropped. Drop-content tags (script, iframe, ...) take
//   their whole body with them; nested opens of the same name bump a depth counter so
//   only the outermost close ends the drop. Other disallowed tags are unwrapped.
// - Attributes outside the tag's allow-list, any `on*` attribute, URL attributes with a
//   scheme outside the policy, and `style` values carrying CSS active content are dropped.
// - Comments are always dropped.
// - Output is balanced: closes without a matching open are dropped, non-void `<x/>` is
//   written as `<x></x>`, and elements left open at EOF are closed.
// - Re-sanitizing a sanitized document is a no-op.

use crate::charref::decode_char_refs;
use crate::css;
use crate::policy::{is_event_handler, Policy};
use crate::tokenizer::{is_raw_text, is_void, tokenize, Attribute, Tag, Token};
use memchr::memchr2;
use std::collections::HashMap;
use std::fmt;

/// Token stream that passed the policy. Only [`sanitize`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedDocument {
    tokens: Vec<Token>,
}

impl SanitizedDocument {
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serialize(&self.tokens, &mut out);
        out
    }
}

impl fmt::Display for SanitizedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

/// Counters reported once per call.
#[derive(Debug, Default, Clone, Copy)]
struct Dropped {
    tags: usize,
    attributes: usize,
    comments: usize,
    closes: usize,
}

/// A drop-content element being skipped.
struct Skip {
    name: String,
    depth: usize,
}

struct Sanitizer<'p> {
    policy: &'p Policy,
    out: Vec<Token>,
    /// Open allowed non-void elements, innermost last.
    open: Vec<String>,
    /// How many of each name are in `open`; keeps unmatched closes O(1).
    open_counts: HashMap<String, usize>,
    skip: Option<Skip>,
    dropped: Dropped,
}

pub fn sanitize<I>(tokens: I, policy: &Policy) -> SanitizedDocument
where
    I: IntoIterator<Item = Token>,
{
    let mut s = Sanitizer {
        policy,
        out: Vec::new(),
        open: Vec::new(),
        open_counts: HashMap::new(),
        skip: None,
        dropped: Dropped::default(),
    };
    for tok in tokens {
        s.token(tok);
    }
    s.finish()
}

/// Tokenize and sanitize in one go.
pub fn sanitize_str(html: &str, policy: &Policy) -> SanitizedDocument {
    sanitize(tokenize(html), policy)
}

impl<'p> Sanitizer<'p> {
    fn token(&mut self, tok: Token) {
        if let Some(skip) = self.skip.as_mut() {
            match &tok {
                // `/>` on a non-void element is ignored by browsers, so it opens too.
                Token::Open(t) | Token::SelfClosing(t) if t.name == skip.name => skip.depth += 1,
                Token::Close(name) if *name == skip.name => {
                    skip.depth -= 1;
                    if skip.depth == 0 {
                        self.skip = None;
                    }
                }
                _ => {}
            }
            return;
        }

        match tok {
            Token::Open(tag) => self.start(tag, false),
            Token::SelfClosing(tag) => self.start(tag, true),
            Token::Close(name) => self.end(name),
            Token::Text(text) => self.text(text),
            Token::Comment(_) => self.dropped.comments += 1,
        }
    }

    fn start(&mut self, tag: Tag, self_closing: bool) {
        if !self.policy.allows_tag(&tag.name) {
            self.dropped.tags += 1;
            // `<script/>` still opens a raw-text body in the tokenizer; other
            // self-closed drop-content tags have nothing to skip.
            let opens_body = !is_void(&tag.name) && (!self_closing || is_raw_text(&tag.name));
            if self.policy.drops_content(&tag.name) && opens_body {
                tracing::trace!(tag = %tag.name, "dropping element with content");
                self.skip = Some(Skip {
                    name: tag.name,
                    depth: 1,
                });
            } else {
                tracing::trace!(tag = %tag.name, "unwrapping element");
            }
            return;
        }

        let tag = self.filter_attributes(tag);

        if is_void(&tag.name) {
            self.out.push(if self_closing {
                Token::SelfClosing(tag)
            } else {
                Token::Open(tag)
            });
        } else if self_closing && !is_raw_text(&tag.name) {
            let name = tag.name.clone();
            self.out.push(Token::Open(tag));
            self.out.push(Token::Close(name));
        } else {
            self.push_open(tag.name.clone());
            self.out.push(Token::Open(tag));
        }
    }

    fn end(&mut self, name: String) {
        if !self.policy.allows_tag(&name) {
            return;
        }
        if self.open_counts.get(&name).copied().unwrap_or(0) == 0 {
            self.dropped.closes += 1;
            return;
        }
        // Close everything down to and including the innermost element with this name.
        while let Some(top) = self.open.pop() {
            self.dec_count(&top);
            let done = top == name;
            self.out.push(Token::Close(top));
            if done {
                break;
            }
        }
    }

    fn text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        if self.open.last().is_some_and(|n| n == "style") && !self.style_text_is_inert(&text) {
            tracing::trace!("dropping style sheet");
            self.dropped.tags += 1;
            return;
        }
        if let Some(Token::Text(prev)) = self.out.last_mut() {
            prev.push_str(&text);
        } else {
            self.out.push(Token::Text(text));
        }
    }

    /// Style text is serialized verbatim, so it must not be able to form markup. Under
    /// `svg` or `math` a browser parses `<style>` as ordinary text, so nothing is kept there.
    fn style_text_is_inert(&self, text: &str) -> bool {
        let foreign = ["svg", "math"]
            .iter()
            .any(|n| self.open_counts.get(*n).is_some_and(|&c| c > 0));
        !foreign && !text.contains('<') && !css::has_active_content(text)
    }

    fn filter_attributes(&mut self, tag: Tag) -> Tag {
        let Tag { name, attrs } = tag;
        let mut kept = Vec::with_capacity(attrs.len());
        for attr in attrs {
            if self.keep_attribute(&name, &attr) {
                kept.push(attr);
            } else {
                self.dropped.attributes += 1;
                tracing::trace!(tag = %name, attribute = %attr.name, "dropping attribute");
            }
        }
        Tag { name, attrs: kept }
    }

    fn keep_attribute(&self, tag: &str, attr: &Attribute) -> bool {
        if is_event_handler(&attr.name) || !self.policy.allows_attribute(tag, &attr.name) {
            return false;
        }
        if self.policy.is_url_attribute(&attr.name) && !self.policy.allows_url(&attr.value) {
            return false;
        }
        if attr.name == "style" && css::has_active_content(&decode_char_refs(&attr.value)) {
            return false;
        }
        true
    }

    fn push_open(&mut self, name: String) {
        *self.open_counts.entry(name.clone()).or_insert(0) += 1;
        self.open.push(name);
    }

    fn dec_count(&mut self, name: &str) {
        if let Some(c) = self.open_counts.get_mut(name) {
            *c -= 1;
        }
    }

    fn finish(mut self) -> SanitizedDocument {
        while let Some(name) = self.open.pop() {
            self.out.push(Token::Close(name));
        }

        let d = self.dropped;
        tracing::debug!(
            tokens = self.out.len(),
            dropped_tags = d.tags,
            dropped_attributes = d.attributes,
            dropped_comments = d.comments,
            dropped_closes = d.closes,
            "sanitized document"
        );
        SanitizedDocument { tokens: self.out }
    }
}

/* ============================= Serialization ============================= */

/// Write tokens as HTML. Text is escaped except inside `style`, whose body the
/// tokenizer guarantees cannot contain its own end tag.
pub(crate) fn serialize(tokens: &[Token], out: &mut String) {
    let mut in_style = false;
    for tok in tokens {
        match tok {
            Token::Open(tag) => {
                write_tag(tag, false, out);
                in_style = tag.name == "style";
            }
            Token::SelfClosing(tag) => write_tag(tag, true, out),
            Token::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                in_style = false;
            }
            Token::Text(text) if in_style => out.push_str(text),
            Token::Text(text) => escape_text(text, out),
            Token::Comment(_) => {}
        }
    }
}

fn write_tag(tag: &Tag, self_closing: bool, out: &mut String) {
    out.push('<');
    out.push_str(&tag.name);
    for attr in &tag.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        for c in attr.value.chars() {
            match c {
                '"' => out.push_str("&quot;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
        out.push('"');
    }
    if self_closing {
        out.push_str(" />");
    } else {
        out.push('>');
    }
}

fn escape_text(text: &str, out: &mut String) {
    let b = text.as_bytes();
    let mut start = 0usize;
    while let Some(off) = memchr2(b'<', b'>', &b[start..]) {
        let pos = start + off;
        out.push_str(&text[start..pos]);
        out.push_str(if b[pos] == b'<' { "&lt;" } else { "&gt;" });
        start = pos + 1;
    }
    out.push_str(&text[start..]);
}
