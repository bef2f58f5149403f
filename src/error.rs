// src/error.rs
//
// Errors for configuration and request validation.
//
// Sanitizing never fails: malformed markup and policy violations are handled in the
// pipeline itself. Everything here is raised before any HTML is processed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid theme {0:?} (expected \"light\" or \"dark\")")]
    InvalidTheme(String),

    #[error("blocked-image placeholder {0:?} must be a non-network URL the policy accepts")]
    InvalidPlaceholder(String),

    #[error("failed to read config {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot locate config directory")]
    ConfigDir(#[from] xdg::BaseDirectoriesError),

    #[error("input is {size} bytes, above the {limit}-byte limit")]
    InputTooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
