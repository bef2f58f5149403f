// src/pipeline.rs
//
// Tokenize → sanitize → present, with the policy fixed at construction.

use crate::error::{Error, Result};
use crate::policy::Policy;
use crate::presentation::{apply_preferences, PresentationConfig, Preferences, PresentationResult};
use crate::sanitizer::{sanitize_str, SanitizedDocument};
use crate::url::{self, UrlKind};
use std::sync::OnceLock;

/// Schemes a blocked-image placeholder may never use.
const NETWORK_SCHEMES: &[&str] = &["http", "https", "ftp", "ws", "wss"];

/// Immutable after construction; share one instance across threads by reference.
#[derive(Debug, Clone)]
pub struct Pipeline {
    policy: Policy,
    presentation: PresentationConfig,
}

impl Pipeline {
    /// Validate the configuration up front so that no call can half-apply it.
    pub fn new(policy: Policy, presentation: PresentationConfig) -> Result<Self> {
        let placeholder = &presentation.blocked_image_placeholder;
        // Relative and protocol-relative references resolve against the viewer's origin.
        let inert = match url::classify(placeholder) {
            UrlKind::Absolute(scheme) => !NETWORK_SCHEMES.contains(&scheme.as_str()),
            UrlKind::Relative | UrlKind::Malformed => false,
        };
        if !inert || !policy.allows_url(placeholder) {
            return Err(Error::InvalidPlaceholder(placeholder.clone()));
        }
        Ok(Self {
            policy,
            presentation,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn presentation(&self) -> &PresentationConfig {
        &self.presentation
    }

    pub fn sanitize(&self, html: &str) -> SanitizedDocument {
        sanitize_str(html, &self.policy)
    }

    pub fn sanitize_html(&self, html: &str) -> String {
        self.sanitize(html).to_html()
    }

    pub fn sanitize_and_present(&self, html: &str, prefs: Preferences) -> PresentationResult {
        let doc = self.sanitize(html);
        apply_preferences(&doc, &self.policy, &self.presentation, prefs)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            policy: Policy::email(),
            presentation: PresentationConfig::default(),
        }
    }
}

/// Process-wide pipeline with the built-in email policy.
pub fn default_pipeline() -> &'static Pipeline {
    static DEFAULT: OnceLock<Pipeline> = OnceLock::new();
    DEFAULT.get_or_init(Pipeline::default)
}
