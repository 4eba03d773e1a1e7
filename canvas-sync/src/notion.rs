#![doc = "Note-store client: implements the core `NoteStore` trait against the Notion REST API."]
//
//! # Notion client
//!
//! - [`NotionClient::query_by_text`] posts a `rich_text equals` filter to
//!   `/databases/{id}/query` and returns the first hit.
//! - [`NotionClient::create_page`] posts the typed property map to `/pages`
//!   under the database parent.
//!
//! Requests carry `Authorization: Bearer` and the `Notion-Version` header.
//! Every non-success status becomes a [`StoreError::Status`] with the
//! response body, so the pipeline can log what the API rejected.

use std::time::Duration;

use async_trait::async_trait;
use canvas_sync_core::contract::{NoteStore, PageId};
use canvas_sync_core::errors::StoreError;
use canvas_sync_core::properties::PageProperties;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone)]
pub struct NotionSettings {
    pub token: String,
    pub version: String,
}

impl std::fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionSettings")
            .field("token", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct PageRef {
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageRef>,
}

/// Filter body matching pages whose text `property` equals `value`.
pub fn query_body(property: &str, value: &str) -> Value {
    json!({
        "filter": {
            "property": property,
            "rich_text": { "equals": value }
        },
        "page_size": 1
    })
}

pub fn create_body(database_id: &str, properties: &PageProperties) -> Value {
    json!({
        "parent": { "database_id": database_id },
        "properties": properties
    })
}

pub struct NotionClient {
    http: Client,
    base_url: String,
    settings: NotionSettings,
}

impl NotionClient {
    pub fn new(settings: NotionSettings, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(timeout).build()?;
        tracing::info!(
            version = %settings.version,
            timeout_secs = timeout.as_secs(),
            "Initialised Notion client"
        );
        Ok(NotionClient {
            http,
            base_url: NOTION_API_URL.to_string(),
            settings,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.settings.token)
            .header("Notion-Version", &self.settings.version)
    }

    async fn check(resp: Response) -> Result<Response, StoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl NoteStore for NotionClient {
    async fn query_by_text(
        &self,
        database_id: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<PageId>, StoreError> {
        let resp = self
            .post(&format!("/databases/{database_id}/query"))
            .json(&query_body(property, value))
            .send()
            .await?;
        let parsed: QueryResponse = Self::check(resp).await?.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .map(|page| page.id)
            .find(|id| !id.is_empty()))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: &PageProperties,
    ) -> Result<PageId, StoreError> {
        tracing::debug!(
            database_id,
            properties = properties.len(),
            "Creating Notion page"
        );
        let resp = self
            .post("/pages")
            .json(&create_body(database_id, properties))
            .send()
            .await?;
        let page: PageRef = Self::check(resp).await?.json().await?;
        if page.id.is_empty() {
            return Err(StoreError::MissingId);
        }
        Ok(page.id)
    }
}
