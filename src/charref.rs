// src/charref.rs
//
// Character-reference decoding for attribute values.
//
// Only used to see attribute values the way a browser will before judging them;
// the sanitized output keeps the original, undecoded bytes.

use std::borrow::Cow;

/// Named references that can change how a URL or a CSS value is read.
/// Anything not listed is left as-is.
const NAMED: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("colon", ':'),
    ("semi", ';'),
    ("sol", '/'),
    ("bsol", '\\'),
    ("quest", '?'),
    ("num", '#'),
    ("period", '.'),
    ("comma", ','),
    ("excl", '!'),
    ("equals", '='),
    ("plus", '+'),
    ("lpar", '('),
    ("rpar", ')'),
    ("lowbar", '_'),
    ("commat", '@'),
    ("Tab", '\t'),
    ("NewLine", '\n'),
];

/// Legacy references a browser still honors without the trailing ';'.
const LEGACY: &[&str] = &["amp", "lt", "gt", "quot", "nbsp"];

pub fn decode_char_refs(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let b = s.as_bytes();
    let n = b.len();
    let mut out = String::with_capacity(n);
    let mut i = 0usize;
    let mut copied = 0usize;

    while i < n {
        if b[i] != b'&' {
            i += 1;
            continue;
        }
        if let Some((ch, len)) = decode_at(&s[i + 1..]) {
            out.push_str(&s[copied..i]);
            out.push(ch);
            i += 1 + len;
            copied = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&s[copied..]);
    Cow::Owned(out)
}

/// Decode the reference right after a '&'. Returns the char and the bytes consumed.
fn decode_at(rest: &str) -> Option<(char, usize)> {
    let b = rest.as_bytes();
    if b.first() == Some(&b'#') {
        return decode_numeric(b);
    }

    let name_len = b
        .iter()
        .take(32)
        .take_while(|c| c.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    let terminated = b.get(name_len) == Some(&b';');

    if terminated {
        if let Some(&(_, ch)) = NAMED.iter().find(|(n, _)| *n == name) {
            return Some((ch, name_len + 1));
        }
    }
    if LEGACY.contains(&name) {
        let ch = NAMED.iter().find(|(n, _)| *n == name).map(|&(_, c)| c)?;
        return Some((ch, name_len + usize::from(terminated)));
    }
    None
}

fn decode_numeric(b: &[u8]) -> Option<(char, usize)> {
    let (radix, digits_start) = match b.get(1) {
        Some(b'x') | Some(b'X') => (16, 2),
        _ => (10, 1),
    };

    let mut value: u32 = 0;
    let mut i = digits_start;
    while i < b.len() {
        let Some(d) = (b[i] as char).to_digit(radix) else {
            break;
        };
        value = value.saturating_mul(radix).saturating_add(d);
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if b.get(i) == Some(&b';') {
        i += 1;
    }

    let ch = match value {
        0 => '\u{FFFD}',
        v => char::from_u32(v).unwrap_or('\u{FFFD}'),
    };
    Some((ch, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strings_are_borrowed() {
        assert!(matches!(decode_char_refs("https://x/y"), Cow::Borrowed(_)));
    }

    #[test]
    fn numeric_refs() {
        assert_eq!(decode_char_refs("&#106;&#x61;&#X76;a"), "java");
        assert_eq!(decode_char_refs("&#0000106avascript"), "javascript");
        assert_eq!(decode_char_refs("&#x3a;"), ":");
        assert_eq!(decode_char_refs("&#0;"), "\u{FFFD}");
        assert_eq!(decode_char_refs("&#99999999999;"), "\u{FFFD}");
    }

    #[test]
    fn named_refs() {
        assert_eq!(decode_char_refs("java&Tab;script&colon;"), "java\tscript:");
        assert_eq!(decode_char_refs("a&amp;b&ampc&amp x"), "a&b&ampc& x");
        assert_eq!(decode_char_refs("&copy; 2024"), "&copy; 2024");
    }

    #[test]
    fn incomplete_refs_stay_literal() {
        assert_eq!(decode_char_refs("&#;&#x;& x"), "&#;&#x;& x");
    }
}
