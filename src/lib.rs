// src/lib.rs
//
// mailscrub: make untrusted email HTML safe to display.
//
//   raw HTML → tokenizer → sanitizer (allow-list policy) → presentation → safe HTML
//
// Every string input yields output; malformed markup degrades, it never errors.
// The only errors are configuration errors, raised before any processing.
//
// The output is necessary but not sufficient for safety: embed it in an isolated
// rendering context (e.g. a sandboxed iframe without `allow-scripts`) that has no
// access to the host application's session or credentials.

pub mod config;
pub mod css;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod policy;
pub mod presentation;
pub mod sanitizer;
pub mod tokenizer;
pub mod url;

mod charref;

pub use error::{Error, Result};
pub use pipeline::{default_pipeline, Pipeline};
pub use policy::{Policy, PolicyBuilder};
pub use presentation::{PresentationConfig, PresentationResult, Preferences, Theme};
pub use sanitizer::{sanitize, SanitizedDocument};
pub use tokenizer::{tokenize, Attribute, Tag, Token};

/// Sanitize and present `html` with the built-in email policy.
pub fn sanitize_and_present(html: &str, prefs: Preferences) -> PresentationResult {
    default_pipeline().sanitize_and_present(html, prefs)
}

/// Sanitize `html` with the built-in email policy, without presentation changes.
pub fn sanitize_html(html: &str) -> String {
    default_pipeline().sanitize_html(html)
}
