use canvas_sync::load_config::{load_config, DEFAULT_TIMEOUT_SECS};
use canvas_sync::telegram::ParseMode;
use canvas_sync_core::config::{DedupePolicy, DEFAULT_CANVAS_API_URL};
use serial_test::serial;
use std::env;
use std::fs::write;
use std::time::Duration;
use tempfile::NamedTempFile;

const REQUIRED: &[(&str, &str)] = &[
    ("CANVAS_API_TOKEN", "canvas-token"),
    ("NOTION_API_TOKEN", "notion-token"),
    ("NOTION_DATABASE_ID_COURSES", "db-courses"),
    ("NOTION_DATABASE_ID_ASSIGNMENTS", "db-assignments"),
    ("NOTION_DATABASE_ID_FILES", "db-files"),
    ("NOTION_DATABASE_ID_ANNOUNCEMENTS", "db-announcements"),
    ("TELEGRAM_BOT_TOKEN", "123:abc"),
    ("TELEGRAM_CHAT_ID", "-100200"),
];

fn set_required_env() {
    for (key, value) in REQUIRED {
        env::set_var(key, value);
    }
    env::remove_var("CANVAS_API_URL");
}

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).expect("write config");
    file
}

/// Environment alone is enough; everything else falls back to defaults.
#[test]
#[serial]
fn test_load_config_from_env_only() {
    set_required_env();

    let config = load_config(None).expect("Config should load from env");

    assert_eq!(config.sync.canvas.api_url, DEFAULT_CANVAS_API_URL);
    assert_eq!(config.sync.canvas.web_url, "https://portal.uet.vnu.edu.vn");
    assert_eq!(config.sync.canvas.token, "canvas-token");
    assert_eq!(config.sync.databases.assignments, "db-assignments");
    assert_eq!(config.sync.on_query_error, DedupePolicy::TreatAsAbsent);
    assert_eq!(config.notion.version, "2022-06-28");
    assert_eq!(config.telegram.chat_id, "-100200");
    assert_eq!(config.telegram.parse_mode, None);
    assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
}

#[test]
#[serial]
fn test_load_config_applies_file_settings() {
    set_required_env();
    let file = config_file(
        r#"
canvas:
  api_url: https://canvas.example.edu/api/v1
  web_url: https://learn.example.edu/
notion:
  version: "2025-09-03"
telegram:
  parse_mode: MarkdownV2
http:
  timeout_secs: 5
sync:
  on_query_error: skip_record
"#,
    );

    let config = load_config(Some(file.path())).expect("Config should load");

    assert_eq!(config.sync.canvas.api_url, "https://canvas.example.edu/api/v1");
    assert_eq!(config.sync.canvas.web_url, "https://learn.example.edu");
    assert_eq!(config.notion.version, "2025-09-03");
    assert_eq!(config.telegram.parse_mode, Some(ParseMode::MarkdownV2));
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.sync.on_query_error, DedupePolicy::SkipRecord);
}

#[test]
#[serial]
fn test_env_base_url_wins_over_file() {
    set_required_env();
    env::set_var("CANVAS_API_URL", "https://env.example.edu/api/v1/");
    let file = config_file("canvas:\n  api_url: https://file.example.edu/api/v1\n");

    let config = load_config(Some(file.path())).expect("Config should load");
    env::remove_var("CANVAS_API_URL");

    assert_eq!(config.sync.canvas.api_url, "https://env.example.edu/api/v1");
    assert_eq!(config.sync.canvas.web_url, "https://env.example.edu");
}

#[test]
#[serial]
fn test_empty_file_is_accepted() {
    set_required_env();
    let file = config_file("");
    assert!(load_config(Some(file.path())).is_ok());
}

#[test]
#[serial]
fn test_missing_secret_is_reported_by_name() {
    set_required_env();
    env::remove_var("TELEGRAM_CHAT_ID");

    let err = load_config(None).unwrap_err();
    assert!(
        err.to_string().contains("TELEGRAM_CHAT_ID"),
        "expected missing variable in error, got: {err}"
    );
}

#[test]
#[serial]
fn test_invalid_yaml_is_a_parse_error() {
    set_required_env();
    let file = config_file("not-yaml: [:::");

    let msg = load_config(Some(file.path())).unwrap_err().to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_unknown_policy_is_rejected() {
    set_required_env();
    let file = config_file("sync:\n  on_query_error: retry_forever\n");
    assert!(load_config(Some(file.path())).is_err());
}

#[test]
#[serial]
fn test_zero_timeout_is_rejected() {
    set_required_env();
    let file = config_file("http:\n  timeout_secs: 0\n");
    assert!(load_config(Some(file.path())).is_err());
}
