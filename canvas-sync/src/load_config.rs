/// `load_config` module: merges an optional static YAML file with environment secrets into an [`AppConfig`].
///
/// # Responsibilities
/// - Parse the optional YAML file (non-secret tuning only) into typed sections
/// - Read tokens and destination ids from the environment
/// - Apply defaults: LMS base URL, web host, Notion API version, HTTP timeout,
///   plain-text notifications, and "treat as absent" for failed existence queries
///
/// Environment always wins over the file for values both can set.
///
/// # Errors
/// Everything here returns `anyhow::Error` and is surfaced at the CLI boundary.
use anyhow::Result;
use canvas_sync_core::config::{
    CanvasConfig, DatabaseIds, DedupePolicy, SyncConfig, DEFAULT_CANVAS_API_URL,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::notion::{NotionSettings, DEFAULT_NOTION_VERSION};
use crate::telegram::{ParseMode, TelegramSettings};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub canvas: CanvasSection,
    pub notion: NotionSection,
    pub telegram: TelegramSection,
    pub http: HttpSection,
    pub sync: SyncSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasSection {
    pub api_url: Option<String>,
    pub web_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotionSection {
    pub version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelegramSection {
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSection {
    pub on_query_error: Option<DedupePolicy>,
}

/// Fully merged configuration for one run.
#[derive(Debug)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub notion: NotionSettings,
    pub telegram: TelegramSettings,
    pub timeout: Duration,
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required_env(key: &str) -> Result<String> {
    match optional_env(key) {
        Some(value) => {
            info!(var = key, "Found required environment variable");
            Ok(value)
        }
        None => {
            error!(var = key, "Required environment variable not set");
            Err(anyhow::anyhow!("{key} environment variable not set"))
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads the optional YAML file at `path` and merges in environment variables.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let file = match path {
        Some(path) => read_file_config(path)?,
        None => {
            info!("No config file given, using environment and defaults");
            FileConfig::default()
        }
    };

    let api_url = optional_env("CANVAS_API_URL")
        .or(file.canvas.api_url)
        .unwrap_or_else(|| DEFAULT_CANVAS_API_URL.to_string());
    let mut canvas = CanvasConfig::new(api_url, required_env("CANVAS_API_TOKEN")?);
    if let Some(web_url) = file.canvas.web_url {
        canvas.web_url = web_url.trim_end_matches('/').to_string();
    }

    let databases = DatabaseIds {
        courses: required_env("NOTION_DATABASE_ID_COURSES")?,
        assignments: required_env("NOTION_DATABASE_ID_ASSIGNMENTS")?,
        files: required_env("NOTION_DATABASE_ID_FILES")?,
        announcements: required_env("NOTION_DATABASE_ID_ANNOUNCEMENTS")?,
    };

    let notion = NotionSettings {
        token: required_env("NOTION_API_TOKEN")?,
        version: file
            .notion
            .version
            .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
    };

    let telegram = TelegramSettings {
        bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
        chat_id: required_env("TELEGRAM_CHAT_ID")?,
        parse_mode: file.telegram.parse_mode,
    };

    let timeout_secs = file.http.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        error!("http.timeout_secs must be greater than zero");
        anyhow::bail!("http.timeout_secs must be greater than zero");
    }

    let sync = SyncConfig {
        canvas,
        databases,
        on_query_error: file.sync.on_query_error.unwrap_or_default(),
    };
    sync.trace_loaded();
    info!(
        timeout_secs,
        notion_version = %notion.version,
        parse_mode = ?telegram.parse_mode,
        "Config loaded and merged successfully"
    );

    Ok(AppConfig {
        sync,
        notion,
        telegram,
        timeout: Duration::from_secs(timeout_secs),
    })
}
