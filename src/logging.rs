// src/logging.rs
//
// Logging init: structured events to stderr, filtered by `RUST_LOG`.
//
// stdout carries the sanitized document, so nothing is ever logged there. Message
// content is never logged either; events only carry tag/attribute names and counts.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,mailscrub=info";

pub fn init_logging() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
