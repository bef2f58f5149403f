// tests/config.rs
//
// Config files on disk driving a pipeline.

use mailscrub::config::MailscrubConfig;
use mailscrub::{Error, Preferences, Theme};
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn config_file_drives_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
max_input_bytes = 1024

[policy]
extra_schemes = ["tel"]
extra_drop_content = ["blink"]

[presentation]
force_link_targets = false
blocked_image_placeholder = "cid:hidden"
"#,
    );

    let cfg = MailscrubConfig::load(&path).unwrap();
    assert_eq!(cfg.max_input_bytes, 1024);
    assert!(cfg.check_input_size(2048).is_err());

    let pipeline = cfg.build_pipeline().unwrap();
    assert_eq!(
        pipeline.sanitize_html(r#"<a href="tel:+15550100">call</a><blink>gone</blink>"#),
        r#"<a href="tel:+15550100">call</a>"#
    );

    let result = pipeline.sanitize_and_present(
        r#"<a href="https://x">x</a><img src="https://t/p.gif">"#,
        Preferences {
            theme: Theme::Light,
            should_load_images: false,
        },
    );
    assert!(result.has_blocked_images);
    assert!(result.processed_html.contains(r#"src="cid:hidden""#));
    assert!(!result.processed_html.contains("target="));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = TempDir::new().unwrap();
    let err = MailscrubConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::ConfigRead { .. }));
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "max_input_bytes = \"lots\"\n");
    let err = MailscrubConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { .. }));
}

#[test]
fn network_placeholder_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[presentation]\nblocked_image_placeholder = \"https://tracker.example/p.gif\"\n",
    );
    let cfg = MailscrubConfig::load(&path).unwrap();
    assert!(matches!(
        cfg.build_pipeline(),
        Err(Error::InvalidPlaceholder(_))
    ));
}

#[test]
fn empty_file_means_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    assert_eq!(
        MailscrubConfig::load(&path).unwrap(),
        MailscrubConfig::default()
    );
}
