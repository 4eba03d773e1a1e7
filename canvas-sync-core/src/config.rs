use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default LMS API base, used when neither the environment nor the config file set one.
pub const DEFAULT_CANVAS_API_URL: &str = "https://portal.uet.vnu.edu.vn/api/v1";

/// Everything the orchestrator needs to know about the run. Secrets live here
/// only in memory; nothing is written back.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub canvas: CanvasConfig,
    pub databases: DatabaseIds,
    pub on_query_error: DedupePolicy,
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_url = %self.canvas.api_url,
            web_url = %self.canvas.web_url,
            on_query_error = ?self.on_query_error,
            "Loaded SyncConfig"
        );
        debug!(databases = ?self.databases, "Destination databases");
    }
}

#[derive(Clone)]
pub struct CanvasConfig {
    pub api_url: String,
    /// Host used to build human-facing course links.
    pub web_url: String,
    pub token: String,
}

impl CanvasConfig {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let web_url = derive_web_url(&api_url);
        CanvasConfig {
            api_url,
            web_url,
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for CanvasConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasConfig")
            .field("api_url", &self.api_url)
            .field("web_url", &self.web_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Strips the `/api/v1` suffix from an API base to get the web host.
pub fn derive_web_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    trimmed
        .strip_suffix("/api/v1")
        .unwrap_or(trimmed)
        .to_string()
}

/// Destination database ids, one per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseIds {
    pub courses: String,
    pub assignments: String,
    pub files: String,
    pub announcements: String,
}

/// What a failed existence query means for the record being synced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Proceed as if the record does not exist. May create a duplicate during an outage.
    #[default]
    TreatAsAbsent,
    /// Leave the record for the next run.
    SkipRecord,
}
