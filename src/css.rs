// src/css.rs
//
// Detection of CSS constructs that can run code or pull in foreign stylesheets.
//
// Not a CSS sanitizer. Declarations are left alone unless one of the blocked
// constructs appears after comments, escapes and whitespace are folded away.
// Remote `url()` loads are detected the same way, for image blocking.

use crate::url::{self, UrlKind};

/// Blocked constructs, matched against the folded form.
const BLOCKED: &[&str] = &[
    "expression(",
    "javascript:",
    "vbscript:",
    "behavior:",
    "-moz-binding",
    "@import",
];

pub fn has_active_content(css: &str) -> bool {
    let folded = fold(css);
    BLOCKED.iter().any(|b| folded.contains(b))
}

/// Whether the CSS would make the renderer fetch something: a `url()` that is not a
/// `cid:`/`data:` reference or a same-document fragment, or any `image-set()`.
pub fn has_remote_url(css: &str) -> bool {
    let folded = fold(css);
    if folded.contains("image-set(") || folded.contains("image(") {
        return true;
    }
    let mut rest = folded.as_str();
    while let Some(pos) = rest.find("url(") {
        let arg = &rest[pos + 4..];
        let end = arg.find(')').unwrap_or(arg.len());
        if loads_remotely(arg[..end].trim_matches(['"', '\''])) {
            return true;
        }
        rest = &arg[end..];
    }
    false
}

fn loads_remotely(target: &str) -> bool {
    match url::classify(target) {
        UrlKind::Absolute(scheme) => scheme != "cid" && scheme != "data",
        UrlKind::Relative => !(target.is_empty() || target.starts_with('#')),
        UrlKind::Malformed => true,
    }
}

/// Drop every `sep`-separated piece (declaration or rule) that loads a remote resource.
/// Returns an empty string when the remainder still would.
pub fn strip_remote_urls(css: &str, sep: char) -> String {
    let mut buf = [0u8; 4];
    let sep_str: &str = sep.encode_utf8(&mut buf);
    let kept = css
        .split(sep)
        .filter(|piece| !has_remote_url(piece))
        .collect::<Vec<_>>()
        .join(sep_str);
    if has_remote_url(&kept) || has_active_content(&kept) {
        return String::new();
    }
    kept
}

/// Strip comments, resolve backslash escapes, drop whitespace/control chars and lowercase.
fn fold(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '\\' => {
                let mut hex = String::new();
                while hex.len() < 6 {
                    match chars.peek() {
                        Some(h) if h.is_ascii_hexdigit() => {
                            hex.push(*h);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                if hex.is_empty() {
                    // `\x` is a literal x; `\<newline>` is a line continuation.
                    if let Some(next) = chars.next() {
                        push_folded(&mut out, next);
                    }
                } else {
                    if chars.peek().is_some_and(|c| c.is_whitespace()) {
                        chars.next();
                    }
                    let ch = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or('\u{FFFD}');
                    push_folded(&mut out, ch);
                }
            }
            _ => push_folded(&mut out, c),
        }
    }
    out
}

fn push_folded(out: &mut String, c: char) {
    if c.is_whitespace() || c.is_control() {
        return;
    }
    out.push(c.to_ascii_lowercase());
}
