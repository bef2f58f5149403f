// src/main.rs
//
// mailscrub: sanitize an untrusted email HTML body for display.
//
// - Reads one HTML body (file or stdin), lossily decoded as UTF-8.
// - Writes the sanitized, themed document (or a JSON result with --json) to the
//   output file or stdout. The input file is never overwritten.
//
// CLI flags:
//   --theme light|dark  : root container colors (default: light)
//   --load-images       : keep remote image sources instead of blocking them
//   --no-link-targets   : don't force target="_blank" on links
//   --config PATH       : config file (default: $XDG_CONFIG_HOME/mailscrub/config.toml)
//   --json              : print {"processedHtml": ..., "hasBlockedImages": ...}

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use mailscrub::config::MailscrubConfig;
use mailscrub::{logging, Preferences, Theme};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Theme of the message view: "light" or "dark"
    #[arg(long, default_value = "light", value_parser = parse_theme)]
    theme: Theme,

    /// Keep remote image sources
    #[arg(long = "load-images", action = ArgAction::SetTrue)]
    load_images: bool,

    /// Leave link targets as the sender wrote them
    #[arg(long = "no-link-targets", action = ArgAction::SetTrue)]
    no_link_targets: bool,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Input file, or "-" for stdin
    input: PathBuf,

    /// Output file (default: stdout)
    output: Option<PathBuf>,
}

fn parse_theme(s: &str) -> Result<Theme, mailscrub::Error> {
    s.parse()
}

fn main() -> Result<()> {
    if let Err(err) = logging::init_logging() {
        eprintln!("mailscrub: {err:#}");
    }

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => MailscrubConfig::load(path)?,
        None => MailscrubConfig::load_default()?,
    };
    if cli.no_link_targets {
        cfg.presentation.force_link_targets = false;
    }
    let pipeline = cfg.build_pipeline()?;

    let src = read_input(&cli.input)?;
    cfg.check_input_size(src.len())?;
    let html = String::from_utf8_lossy(&src);

    let prefs = Preferences {
        theme: cli.theme,
        should_load_images: cli.load_images,
    };
    let result = pipeline.sanitize_and_present(&html, prefs);
    tracing::info!(
        bytes_in = src.len(),
        bytes_out = result.processed_html.len(),
        blocked_images = result.has_blocked_images,
        "processed message body"
    );

    let out = if cli.json {
        let mut s = serde_json::to_string_pretty(&result)?;
        s.push('\n');
        s
    } else {
        result.processed_html
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, out).with_context(|| format!("writing {}", path.display()))?
        }
        None => io::stdout().lock().write_all(out.as_bytes())?,
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}
