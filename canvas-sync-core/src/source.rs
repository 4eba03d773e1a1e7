//! LMS API client.
//!
//! Course discovery follows the `Link: <...>; rel="next"` header until the LMS
//! stops returning one. Per-course listings are a single page. Announcements
//! fall back to announcement-only discussion topics when the dedicated
//! endpoint answers 404.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::config::CanvasConfig;
use crate::contract::{CourseSource, Paginated};
use crate::errors::SourceError;
use crate::models::{Announcement, Assignment, Course, CourseFile};

/// Records requested per page of the course listing.
pub const COURSES_PER_PAGE: u32 = 100;

/// One page of a listing and the URL of the next one, if any.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Extracts the `rel="next"` target from a `Link` header value.
pub fn next_link(header: &str) -> Option<String> {
    header
        .split(',')
        .find(|link| link.contains("rel=\"next\""))
        .and_then(|link| {
            let start = link.find('<')? + 1;
            let end = link.find('>')?;
            (start < end).then(|| link[start..end].trim().to_string())
        })
}

/// Follows pages from `first_url` until there is no next link or a page fails.
pub async fn collect_pages<T, F, Fut>(first_url: String, mut fetch_page: F) -> Paginated<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Page<T>, SourceError>>,
{
    let mut items = Vec::new();
    let mut url = Some(first_url);
    let mut pages = 0usize;

    while let Some(current) = url.take() {
        match fetch_page(current.clone()).await {
            Ok(page) => {
                pages += 1;
                debug!(url = %current, count = page.items.len(), "Fetched page");
                items.extend(page.items);
                url = match page.next {
                    Some(next) if next == current => {
                        warn!(url = %current, "Next link points at the current page, stopping");
                        None
                    }
                    next => next,
                };
            }
            Err(e) => {
                error!(url = %current, error = %e, pages, "Pagination interrupted");
                return Paginated {
                    items,
                    interrupted: Some(e),
                };
            }
        }
    }
    Paginated::complete(items)
}

/// Fetches announcements for a course, retrying against discussion topics on 404.
pub async fn announcements_with_fallback<F, Fut>(
    api_url: &str,
    course_id: u64,
    mut fetch: F,
) -> Result<Vec<Announcement>, SourceError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<Announcement>, SourceError>>,
{
    let primary = format!("{api_url}/courses/{course_id}/announcements");
    match fetch(primary).await {
        Err(e) if e.is_not_found() => {
            info!(course_id, "Announcements endpoint unavailable, using discussion topics");
            let fallback =
                format!("{api_url}/courses/{course_id}/discussion_topics?only_announcements=true");
            fetch(fallback).await
        }
        other => other,
    }
}

pub struct CanvasClient {
    http: Client,
    api_url: String,
    token: String,
}

impl CanvasClient {
    pub fn new(config: &CanvasConfig, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        info!(api_url = %config.api_url, timeout_secs = timeout.as_secs(), "Initialised LMS client");
        Ok(CanvasClient {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(T, HeaderMap), SourceError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| SourceError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let headers = resp.headers().clone();
        let body = resp.json::<T>().await.map_err(|source| SourceError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok((body, headers))
    }

    async fn get_list<T: DeserializeOwned>(&self, url: String) -> Result<Vec<T>, SourceError> {
        self.get_json::<Vec<T>>(&url).await.map(|(items, _)| items)
    }

    async fn get_page<T: DeserializeOwned>(&self, url: String) -> Result<Page<T>, SourceError> {
        let (items, headers) = self.get_json::<Vec<T>>(&url).await?;
        let next = headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        Ok(Page { items, next })
    }
}

#[async_trait]
impl CourseSource for CanvasClient {
    async fn list_active_courses(&self) -> Paginated<Course> {
        let first = format!(
            "{}/courses?per_page={}&enrollment_state=active&include[]=concluded",
            self.api_url, COURSES_PER_PAGE
        );
        collect_pages(first, |url| self.get_page::<Course>(url)).await
    }

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, SourceError> {
        self.get_list(format!("{}/courses/{}/assignments", self.api_url, course_id))
            .await
    }

    async fn list_files(&self, course_id: u64) -> Result<Vec<CourseFile>, SourceError> {
        self.get_list(format!("{}/courses/{}/files", self.api_url, course_id))
            .await
    }

    async fn list_announcements(&self, course_id: u64) -> Result<Vec<Announcement>, SourceError> {
        announcements_with_fallback(&self.api_url, course_id, |url| self.get_list(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_next_among_several_relations() {
        let header = r#"<https://lms/api/v1/courses?page=1&per_page=100>; rel="current", <https://lms/api/v1/courses?page=2&per_page=100>; rel="next", <https://lms/api/v1/courses?page=1&per_page=100>; rel="first""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://lms/api/v1/courses?page=2&per_page=100")
        );
    }

    #[test]
    fn no_next_relation_means_last_page() {
        let header = r#"<https://lms/api/v1/courses?page=3>; rel="current", <https://lms/api/v1/courses?page=1>; rel="first""#;
        assert_eq!(next_link(header), None);
    }
}
