// src/url.rs
//
// Structural scheme parsing for URL-valued attributes.
//
// The value is decoded and stripped the way a browser's URL parser sees it, then the
// scheme is read from the front. No substring searching: `xjavascript:` is a scheme
// named `xjavascript`, and `java&#x09;script:` is `javascript`.

use crate::charref::decode_char_refs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    /// No scheme: path, query or fragment relative reference (including empty).
    Relative,
    /// An absolute URL with the given lowercase scheme.
    Absolute(String),
    /// A ':' appears before any '/', '?' or '#', but what precedes it is not a valid scheme.
    Malformed,
}

pub fn classify(raw: &str) -> UrlKind {
    let decoded = decode_char_refs(raw);

    // URL parsers drop leading/trailing C0 and space and remove tab/newline anywhere.
    // Removing every control and space character is stricter than that.
    let compact: String = decoded
        .chars()
        .filter(|&c| c > ' ' && c != '\u{7f}')
        .collect();

    let Some(pos) = compact.find([':', '/', '?', '#']) else {
        return UrlKind::Relative;
    };
    if compact.as_bytes()[pos] != b':' {
        return UrlKind::Relative;
    }

    let scheme = &compact[..pos];
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        UrlKind::Absolute(scheme.to_ascii_lowercase())
    } else {
        UrlKind::Malformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(s: &str) -> UrlKind {
        UrlKind::Absolute(s.to_string())
    }

    #[test]
    fn relative_references() {
        assert_eq!(classify(""), UrlKind::Relative);
        assert_eq!(classify("images/a.png"), UrlKind::Relative);
        assert_eq!(classify("/a:b"), UrlKind::Relative);
        assert_eq!(classify("?q=a:b"), UrlKind::Relative);
        assert_eq!(classify("#top"), UrlKind::Relative);
        assert_eq!(classify("//cdn.example.com/x.png"), UrlKind::Relative);
    }

    #[test]
    fn ordinary_schemes() {
        assert_eq!(classify("https://example.com"), abs("https"));
        assert_eq!(classify("MAILTO:a@b.c"), abs("mailto"));
        assert_eq!(classify("cid:part1@mail"), abs("cid"));
    }

    #[test]
    fn obfuscated_javascript() {
        assert_eq!(classify("javascript:alert(1)"), abs("javascript"));
        assert_eq!(classify("  JaVaScRiPt:alert(1)"), abs("javascript"));
        assert_eq!(classify("java\tscript:alert(1)"), abs("javascript"));
        assert_eq!(classify("java&#x09;script:alert(1)"), abs("javascript"));
        assert_eq!(classify("javascript&colon;alert(1)"), abs("javascript"));
        assert_eq!(classify("&#106;avascript:alert(1)"), abs("javascript"));
        assert_eq!(classify("\u{1}javascript:alert(1)"), abs("javascript"));
    }

    #[test]
    fn data_urls() {
        assert_eq!(classify("data:text/html;base64,PHNjcmlwdD4="), abs("data"));
    }

    #[test]
    fn malformed_schemes() {
        assert_eq!(classify("java&unknown;script:x"), UrlKind::Malformed);
        assert_eq!(classify("1http://x"), UrlKind::Malformed);
        assert_eq!(classify(":x"), UrlKind::Malformed);
    }
}
