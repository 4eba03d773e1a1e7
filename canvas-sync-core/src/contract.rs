//! Collaborator interfaces for the sync loop.
//!
//! The orchestrator only talks to the LMS, the note store and the chat bot
//! through these traits. Real HTTP clients implement them in production;
//! `mockall` mocks (exported under the `test-export-mocks` feature) and
//! in-memory fakes implement them in tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::errors::{NotifyError, SourceError, StoreError};
use crate::models::{Announcement, Assignment, Course, CourseFile};
use crate::properties::PageProperties;

/// Identifier the note store assigns to a created page.
pub type PageId = String;

/// Result of a paginated fetch. Pagination stops at the first failed page and
/// keeps what was collected before it.
#[derive(Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub interrupted: Option<SourceError>,
}

impl<T> Paginated<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Paginated {
            items,
            interrupted: None,
        }
    }
}

/// Read side: the LMS.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// All active (and concluded) courses, following every page.
    async fn list_active_courses(&self) -> Paginated<Course>;

    async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, SourceError>;

    async fn list_files(&self, course_id: u64) -> Result<Vec<CourseFile>, SourceError>;

    /// Announcements, falling back to announcement-only discussion topics when
    /// the announcements endpoint is not available for the course.
    async fn list_announcements(&self, course_id: u64) -> Result<Vec<Announcement>, SourceError>;
}

/// Write side: the note store databases.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Id of the first page in `database_id` whose text `property` equals `value`.
    async fn query_by_text(
        &self,
        database_id: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<PageId>, StoreError>;

    async fn create_page(
        &self,
        database_id: &str,
        properties: &PageProperties,
    ) -> Result<PageId, StoreError>;
}

/// Side channel for newly created records.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}
