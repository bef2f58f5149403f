// src/config.rs
//
// User configuration, read from TOML.
//
// - Looked up at $XDG_CONFIG_HOME/mailscrub/config.toml unless a path is given.
// - Every section is optional; missing keys take their defaults.
// - `build_pipeline` validates before anything is processed.

use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::policy::Policy;
use crate::presentation::PresentationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default ceiling on input size, in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 16 * 1024 * 1024;

/// Additions on top of the built-in email policy (`[policy]` section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Extra tags to allow, with global attributes only.
    pub extra_tags: Vec<String>,
    /// Extra URL schemes to allow (e.g. "tel").
    pub extra_schemes: Vec<String>,
    /// Extra disallowed tags whose body is dropped along with them.
    pub extra_drop_content: Vec<String>,
}

impl PolicyConfig {
    pub fn build(&self) -> Policy {
        let mut b = Policy::email()
            .into_builder()
            .schemes(self.extra_schemes.as_slice())
            .drop_content(self.extra_drop_content.as_slice());
        for tag in &self.extra_tags {
            b = b.tag(tag, &[]);
        }
        b.build()
    }
}

/// Configuration loaded from `~/.config/mailscrub/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailscrubConfig {
    /// Inputs larger than this are refused before processing.
    pub max_input_bytes: usize,
    pub policy: PolicyConfig,
    pub presentation: PresentationConfig,
}

impl Default for MailscrubConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            policy: PolicyConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

/// Path of the user config file, if one exists.
pub fn config_path() -> Result<Option<PathBuf>> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mailscrub")?;
    Ok(xdg_dirs.find_config_file("config.toml"))
}

impl MailscrubConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the user config if present, otherwise built-in defaults. Never writes.
    pub fn load_default() -> Result<Self> {
        match config_path()? {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn build_pipeline(&self) -> Result<Pipeline> {
        Pipeline::new(self.policy.build(), self.presentation.clone())
    }

    pub fn check_input_size(&self, size: usize) -> Result<()> {
        if size > self.max_input_bytes {
            return Err(Error::InputTooLarge {
                size,
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }
}
