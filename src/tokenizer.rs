// src/tokenizer.rs
//
// HTML tokenizer for untrusted mail bodies.
//
// - Splits input into open / close / self-closing tags, text and comments. Nothing is
//   interpreted or executed; the output is purely structural.
// - Total: never fails. A tag that runs into EOF (including inside a quoted value)
//   degrades to Text from its '<' onward.
// - Tag and attribute names are ASCII-lowercased. Attribute values and text keep their
//   original bytes (character references are NOT decoded here).
// - Duplicate attributes: first occurrence wins.
// - RAW-TEXT elements (script, style, xmp, iframe, noembed, noframes, noscript, textarea,
//   title) swallow everything up to their matching end tag as one Text token, the same
//   way a browser does. `plaintext` swallows the rest of the input.
// - Comments: `<!-- ... -->` (also `--!>`, `<!-->`, `<!--->`), plus bogus comments for
//   `<!...>`, `<?...>` and `</` followed by a non-letter.
// - NUL is replaced by U+FFFD before scanning.
// - UTF-8 safe: slices are only ever cut at ASCII structural bytes.

use memchr::{memchr, memmem};
use std::borrow::Cow;
use std::collections::HashSet;

/// A single `name="value"` pair on a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Name and attributes of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Replace the value of `name`, or append it if absent.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(a) => a.value = value,
            None => self.attrs.push(Attribute::new(name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Open(Tag),
    Close(String),
    SelfClosing(Tag),
    Text(String),
    Comment(String),
}

/* =============================== Core sets =============================== */

pub(crate) fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "img"
            | "input"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_raw_text(name: &str) -> bool {
    matches!(
        name,
        "script"
            | "style"
            | "xmp"
            | "iframe"
            | "noembed"
            | "noframes"
            | "noscript"
            | "textarea"
            | "title"
    )
}

/* ============================ Utility predicates ========================= */

#[inline]
fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

/* =============================== Scanning ================================ */

/// What a `<` at some position turned out to be.
enum Markup {
    /// Not markup; the '<' is ordinary text.
    Literal,
    /// Markup that runs into EOF; everything from the '<' onward is text.
    Unterminated,
    /// Markup that produces no token (`</>`). Value is the index after it.
    Ignored(usize),
    /// A token and the index just after it.
    Token(Token, usize),
}

pub fn tokenize(raw: &str) -> Vec<Token> {
    let src: Cow<'_, str> = if memchr(0, raw.as_bytes()).is_some() {
        Cow::Owned(raw.replace('\0', "\u{FFFD}"))
    } else {
        Cow::Borrowed(raw)
    };
    let src = src.as_ref();
    let s = src.as_bytes();
    let n = s.len();

    let mut out = Vec::new();
    let mut text_start = 0usize;
    let mut i = 0usize;

    while i < n {
        let Some(lt) = memchr(b'<', &s[i..]).map(|off| i + off) else {
            break;
        };
        match scan_markup(src, lt) {
            Markup::Literal => {
                i = lt + 1;
            }
            Markup::Unterminated => {
                break;
            }
            Markup::Ignored(end) => {
                push_text(&mut out, &src[text_start..lt]);
                i = end;
                text_start = end;
            }
            Markup::Token(tok, end) => {
                push_text(&mut out, &src[text_start..lt]);
                let raw_name = match &tok {
                    Token::Open(t) | Token::SelfClosing(t) => Some(t.name.clone()),
                    _ => None,
                };
                out.push(tok);
                i = end;

                if let Some(name) = raw_name {
                    if name == "plaintext" {
                        push_text(&mut out, &src[i..]);
                        return out;
                    }
                    if is_raw_text(&name) {
                        i = consume_raw_text(src, i, &name, &mut out);
                    }
                }
                text_start = i;
            }
        }
    }

    push_text(&mut out, &src[text_start..]);
    out
}

/// Append text, merging with a preceding Text token.
fn push_text(out: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Token::Text(text.to_string()));
    }
}

fn scan_markup(src: &str, lt: usize) -> Markup {
    let s = src.as_bytes();
    match s.get(lt + 1) {
        None => Markup::Literal,
        Some(b'!') => {
            if s[lt..].starts_with(b"<!--") {
                scan_comment(src, lt + 4)
            } else {
                scan_bogus_comment(src, lt + 2)
            }
        }
        Some(b'?') => scan_bogus_comment(src, lt + 1),
        Some(b'/') => match s.get(lt + 2) {
            None => Markup::Literal,
            Some(b'>') => Markup::Ignored(lt + 3),
            Some(c) if c.is_ascii_alphabetic() => scan_tag(src, lt + 2, true),
            Some(_) => scan_bogus_comment(src, lt + 2),
        },
        Some(c) if c.is_ascii_alphabetic() => scan_tag(src, lt + 1, false),
        Some(_) => Markup::Literal,
    }
}

/* ============================== Comments ================================ */

/// `start` points just past `<!--`.
fn scan_comment(src: &str, start: usize) -> Markup {
    let s = src.as_bytes();
    let n = s.len();

    // Abrupt closings: <!--> and <!--->
    if s[start..].starts_with(b">") {
        return Markup::Token(Token::Comment(String::new()), start + 1);
    }
    if s[start..].starts_with(b"->") {
        return Markup::Token(Token::Comment(String::new()), start + 2);
    }

    let finder = memmem::Finder::new(b"--");
    let mut k = start;
    while k < n {
        let Some(j) = finder.find(&s[k..]).map(|off| k + off) else {
            break;
        };
        if s.get(j + 2) == Some(&b'>') {
            return Markup::Token(Token::Comment(src[start..j].to_string()), j + 3);
        }
        if s[j + 2..].starts_with(b"!>") {
            return Markup::Token(Token::Comment(src[start..j].to_string()), j + 4);
        }
        k = j + 1;
    }

    // EOF in comment: the comment runs to the end.
    Markup::Token(Token::Comment(src[start..].to_string()), n)
}

/// `<!DOCTYPE ...>`, `<![CDATA[...]]>`, `<?xml ...?>`, `</3>`: everything up to the next '>'.
fn scan_bogus_comment(src: &str, start: usize) -> Markup {
    let s = src.as_bytes();
    match memchr(b'>', &s[start..]) {
        Some(off) => Markup::Token(
            Token::Comment(src[start..start + off].to_string()),
            start + off + 1,
        ),
        None => Markup::Token(Token::Comment(src[start..].to_string()), s.len()),
    }
}

/* =============================== Tag parsing ============================= */

/// Parse a start or end tag. `name_start` points at the first letter of the name.
fn scan_tag(src: &str, name_start: usize, is_end: bool) -> Markup {
    let s = src.as_bytes();
    let n = s.len();

    let mut i = name_start;
    while i < n && !is_ws(s[i]) && s[i] != b'/' && s[i] != b'>' {
        i += 1;
    }
    let name = src[name_start..i].to_ascii_lowercase();

    let mut attrs: Vec<Attribute> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut self_closing = false;

    loop {
        // before attribute name
        while i < n && is_ws(s[i]) {
            i += 1;
        }
        if i >= n {
            return Markup::Unterminated;
        }
        match s[i] {
            b'>' => {
                i += 1;
                break;
            }
            b'/' => {
                i += 1;
                if i < n && s[i] == b'>' {
                    self_closing = true;
                    i += 1;
                    break;
                }
                continue;
            }
            _ => {}
        }

        // attribute name; a leading '=' belongs to the name
        let attr_start = i;
        i += 1;
        while i < n && !is_ws(s[i]) && !matches!(s[i], b'/' | b'>' | b'=') {
            i += 1;
        }
        let attr_name = &src[attr_start..i];

        // after attribute name
        while i < n && is_ws(s[i]) {
            i += 1;
        }
        let mut value = "";
        if i < n && s[i] == b'=' {
            i += 1;
            while i < n && is_ws(s[i]) {
                i += 1;
            }
            if i >= n {
                return Markup::Unterminated;
            }
            match s[i] {
                q @ (b'"' | b'\'') => {
                    let value_start = i + 1;
                    let Some(off) = memchr(q, &s[value_start..]) else {
                        return Markup::Unterminated;
                    };
                    value = &src[value_start..value_start + off];
                    i = value_start + off + 1;
                }
                b'>' => {
                    // `<a href=>`: empty value, the '>' closes the tag on the next pass
                }
                _ => {
                    let value_start = i;
                    while i < n && !is_ws(s[i]) && s[i] != b'>' {
                        i += 1;
                    }
                    value = &src[value_start..i];
                }
            }
        }

        if !is_end {
            let lower = attr_name.to_ascii_lowercase();
            if seen.insert(lower.clone()) {
                attrs.push(Attribute::new(lower, value));
            }
        }
    }

    let tok = if is_end {
        Token::Close(name)
    } else if self_closing {
        Token::SelfClosing(Tag { name, attrs })
    } else {
        Token::Open(Tag { name, attrs })
    };
    Markup::Token(tok, i)
}

/* ============================ Raw-text bodies ============================ */

/// Emit the body of a RAW-TEXT element starting at `i`, then its end tag if present.
/// Returns the index to resume scanning from.
fn consume_raw_text(src: &str, i: usize, name: &str, out: &mut Vec<Token>) -> usize {
    let s = src.as_bytes();
    let n = s.len();

    let Some(close_at) = find_raw_text_end(s, i, name.as_bytes()) else {
        push_text(out, &src[i..]);
        return n;
    };
    push_text(out, &src[i..close_at]);

    match scan_tag(src, close_at + 2, true) {
        Markup::Token(tok, end) => {
            out.push(tok);
            end
        }
        _ => {
            // `</script` followed by an attribute list that never closes
            push_text(out, &src[close_at..]);
            n
        }
    }
}

/// Find `</name` (ASCII case-insensitive) followed by whitespace, '/' or '>'.
fn find_raw_text_end(s: &[u8], from: usize, name: &[u8]) -> Option<usize> {
    let n = s.len();
    let mut j = from;
    while j < n {
        let pos = memchr(b'<', &s[j..]).map(|off| j + off)?;
        let name_end = pos + 2 + name.len();
        if name_end < n
            && s[pos + 1] == b'/'
            && s[pos + 2..name_end].eq_ignore_ascii_case(name)
            && (is_ws(s[name_end]) || s[name_end] == b'/' || s[name_end] == b'>')
        {
            return Some(pos);
        }
        j = pos + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(name: &str, attrs: &[(&str, &str)]) -> Token {
        Token::Open(Tag {
            name: name.to_string(),
            attrs: attrs.iter().map(|(n, v)| Attribute::new(*n, *v)).collect(),
        })
    }

    fn text(t: &str) -> Token {
        Token::Text(t.to_string())
    }

    fn close(name: &str) -> Token {
        Token::Close(name.to_string())
    }

    #[test]
    fn splits_tags_and_text() {
        let toks = tokenize("<p class=x>Hello <b>world</b></p>");
        assert_eq!(
            toks,
            vec![
                open("p", &[("class", "x")]),
                text("Hello "),
                open("b", &[]),
                text("world"),
                close("b"),
                close("p"),
            ]
        );
    }

    #[test]
    fn names_are_lowercased_values_are_not() {
        let toks = tokenize(r#"<DIV Title="MiXeD">X</Div>"#);
        assert_eq!(toks, vec![open("div", &[("title", "MiXeD")]), text("X"), close("div")]);
    }

    #[test]
    fn quoting_styles() {
        let toks = tokenize(r#"<a href='x y' title="a>b" data-z=plain alt>"#);
        assert_eq!(
            toks,
            vec![open(
                "a",
                &[("href", "x y"), ("title", "a>b"), ("data-z", "plain"), ("alt", "")]
            )]
        );
    }

    #[test]
    fn first_duplicate_attribute_wins() {
        let toks = tokenize(r#"<img src="a.png" SRC="b.png">"#);
        assert_eq!(toks, vec![open("img", &[("src", "a.png")])]);
    }

    #[test]
    fn self_closing_only_when_slash_touches_gt() {
        assert_eq!(
            tokenize("<br/>"),
            vec![Token::SelfClosing(Tag::new("br"))]
        );
        assert_eq!(
            tokenize("<a href=x/>"),
            vec![open("a", &[("href", "x/")])]
        );
        assert_eq!(
            tokenize("<img / src=a>"),
            vec![open("img", &[("src", "a")])]
        );
    }

    #[test]
    fn unterminated_tag_is_text() {
        assert_eq!(tokenize("a<img src=x onerror=y"), vec![text("a<img src=x onerror=y")]);
        assert_eq!(tokenize(r#"<p title="never closed>hi"#), vec![text(r#"<p title="never closed>hi"#)]);
        assert_eq!(tokenize("x<"), vec![text("x<")]);
    }

    #[test]
    fn stray_lt_is_text() {
        assert_eq!(tokenize("1 < 2 <3"), vec![text("1 < 2 <3")]);
    }

    #[test]
    fn comments() {
        assert_eq!(
            tokenize("a<!-- hi -->b"),
            vec![text("a"), Token::Comment(" hi ".into()), text("b")]
        );
        assert_eq!(tokenize("<!-->x"), vec![Token::Comment(String::new()), text("x")]);
        assert_eq!(tokenize("<!--->x"), vec![Token::Comment(String::new()), text("x")]);
        assert_eq!(tokenize("<!--a--!>x"), vec![Token::Comment("a".into()), text("x")]);
        assert_eq!(tokenize("<!-- open"), vec![Token::Comment(" open".into())]);
    }

    #[test]
    fn conditional_comment_is_one_comment() {
        let toks = tokenize("<!--[if IE]><script>x()</script><![endif]-->ok");
        assert_eq!(toks.len(), 2);
        assert!(matches!(toks[0], Token::Comment(_)));
        assert_eq!(toks[1], text("ok"));
    }

    #[test]
    fn bogus_comments() {
        assert_eq!(
            tokenize("<!DOCTYPE html><?xml v?></3>x"),
            vec![
                Token::Comment("DOCTYPE html".into()),
                Token::Comment("?xml v?".into()),
                Token::Comment("3".into()),
                text("x"),
            ]
        );
    }

    #[test]
    fn empty_end_tag_ignored() {
        assert_eq!(tokenize("a</>b"), vec![text("ab")]);
    }

    #[test]
    fn raw_text_swallows_markup() {
        let toks = tokenize("<script>if (a<b) { x('</div>') }</SCRIPT >after");
        assert_eq!(
            toks,
            vec![
                open("script", &[]),
                text("if (a<b) { x('</div>') }"),
                close("script"),
                text("after"),
            ]
        );
    }

    #[test]
    fn raw_text_end_needs_delimiter() {
        let toks = tokenize("<style>a</stylex>b</style>");
        assert_eq!(toks, vec![open("style", &[]), text("a</stylex>b"), close("style")]);
    }

    #[test]
    fn self_closing_script_still_opens_raw_text() {
        let toks = tokenize("<script/>alert(1)</script>");
        assert_eq!(
            toks,
            vec![
                Token::SelfClosing(Tag::new("script")),
                text("alert(1)"),
                close("script"),
            ]
        );
    }

    #[test]
    fn noscript_is_raw_text() {
        let toks = tokenize(r#"<noscript><p title="</noscript><img src=x onerror=y>">"#);
        assert_eq!(toks[0], open("noscript", &[]));
        assert_eq!(toks[1], text(r#"<p title=""#));
        assert_eq!(toks[2], close("noscript"));
        assert_eq!(toks[3], open("img", &[("src", "x"), ("onerror", "y")]));
    }

    #[test]
    fn unterminated_raw_text_runs_to_eof() {
        assert_eq!(
            tokenize("<script>alert(1)"),
            vec![open("script", &[]), text("alert(1)")]
        );
    }

    #[test]
    fn plaintext_consumes_rest() {
        assert_eq!(
            tokenize("<plaintext><b>x</b>"),
            vec![open("plaintext", &[]), text("<b>x</b>")]
        );
    }

    #[test]
    fn nul_becomes_replacement_char() {
        assert_eq!(
            tokenize("<a\0b>x\0"),
            vec![open("a\u{FFFD}b", &[]), text("x\u{FFFD}")]
        );
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(
            tokenize("<p title='é'>日本語</p>"),
            vec![open("p", &[("title", "é")]), text("日本語"), close("p")]
        );
    }

    #[test]
    fn equals_may_start_attribute_name() {
        assert_eq!(tokenize("<p =x>"), vec![open("p", &[("=x", "")])]);
    }

    #[test]
    fn empty_value_before_gt() {
        assert_eq!(tokenize("<a href=>x"), vec![open("a", &[("href", "")]), text("x")]);
    }
}
