//! The per-record sync loop shared by every entity kind:
//! dedupe-check → build payload → create → notify.
//!
//! Each source model implements [`SyncEntity`] to describe where it goes, how
//! its page looks and what its notification says. [`Pipeline::sync_entity`]
//! runs the loop and returns a [`SyncOutcome`] instead of raising, so the
//! orchestrator can always move on to the next record.

use std::fmt;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{DatabaseIds, DedupePolicy};
use crate::contract::{NoteStore, Notifier, PageId};
use crate::dedupe::find_existing;
use crate::errors::{PayloadError, StoreError};
use crate::format::{clean_html, format_datetime};
use crate::models::{Announcement, Assignment, Course, CourseFile};
use crate::notify::notify_best_effort;
use crate::properties::{AnnouncementPage, AssignmentPage, CoursePage, FilePage, PageProperties};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Course,
    Assignment,
    File,
    Announcement,
}

impl EntityKind {
    /// Destination property holding the external id as text.
    pub fn id_field(self) -> &'static str {
        match self {
            EntityKind::Course => "Course ID",
            EntityKind::Assignment => "Assignment ID",
            EntityKind::File => "File ID",
            EntityKind::Announcement => "Announcement ID",
        }
    }

    pub fn database(self, databases: &DatabaseIds) -> &str {
        match self {
            EntityKind::Course => &databases.courses,
            EntityKind::Assignment => &databases.assignments,
            EntityKind::File => &databases.files,
            EntityKind::Announcement => &databases.announcements,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Course => "course",
            EntityKind::Assignment => "assignment",
            EntityKind::File => "file",
            EntityKind::Announcement => "announcement",
        };
        f.write_str(name)
    }
}

/// Per-course context a record is synced under.
#[derive(Debug, Clone, Copy)]
pub struct EntityContext<'a> {
    pub course_name: &'a str,
    /// LMS web host, for links the API does not return.
    pub web_url: &'a str,
}

pub trait SyncEntity {
    const KIND: EntityKind;

    fn external_id(&self) -> u64;

    /// Name used in logs.
    fn label(&self) -> &str;

    fn page(&self, ctx: &EntityContext<'_>) -> Result<PageProperties, PayloadError>;

    fn message(&self, ctx: &EntityContext<'_>) -> String;
}

pub fn course_url(web_url: &str, course_id: u64) -> String {
    format!("{}/courses/{}", web_url.trim_end_matches('/'), course_id)
}

impl SyncEntity for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn external_id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        self.name()
    }

    fn page(&self, ctx: &EntityContext<'_>) -> Result<PageProperties, PayloadError> {
        let url = course_url(ctx.web_url, self.id);
        CoursePage {
            name: self.name(),
            course_id: self.id,
            url: &url,
        }
        .into_properties()
    }

    fn message(&self, ctx: &EntityContext<'_>) -> String {
        format!(
            "New course: {} (ID: {})\nLink: {}",
            self.name(),
            self.id,
            course_url(ctx.web_url, self.id)
        )
    }
}

impl SyncEntity for Assignment {
    const KIND: EntityKind = EntityKind::Assignment;

    fn external_id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        self.name()
    }

    fn page(&self, ctx: &EntityContext<'_>) -> Result<PageProperties, PayloadError> {
        AssignmentPage {
            name: self.name(),
            assignment_id: self.id,
            course: ctx.course_name,
            points: self.points(),
            url: self.html_url(),
            due: self.due_at(),
            available_from: self.unlock_at(),
            available_to: self.lock_at(),
        }
        .into_properties()
    }

    fn message(&self, ctx: &EntityContext<'_>) -> String {
        let mut msg = format!(
            "New assignment\nName: {}\nCourse: {}\nLink: {}",
            self.name(),
            ctx.course_name,
            self.html_url().unwrap_or("")
        );
        if let Some(due) = self.due_at() {
            msg.push_str(&format!("\nDue: {}", format_datetime(due)));
        }
        if let Some(from) = self.unlock_at() {
            msg.push_str(&format!("\nAvailable From: {}", format_datetime(from)));
        }
        if let Some(to) = self.lock_at() {
            msg.push_str(&format!("\nAvailable To: {}", format_datetime(to)));
        }
        msg
    }
}

impl SyncEntity for CourseFile {
    const KIND: EntityKind = EntityKind::File;

    fn external_id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        self.display_name()
    }

    fn page(&self, ctx: &EntityContext<'_>) -> Result<PageProperties, PayloadError> {
        FilePage {
            name: self.display_name(),
            file_id: self.id,
            course: ctx.course_name,
            content_type: self.content_type(),
            download_url: self.download_url(),
        }
        .into_properties()
    }

    fn message(&self, ctx: &EntityContext<'_>) -> String {
        format!(
            "New file\nName: {}\nCourse: {}\nLink: {}",
            self.display_name(),
            ctx.course_name,
            self.download_url().unwrap_or("")
        )
    }
}

impl SyncEntity for Announcement {
    const KIND: EntityKind = EntityKind::Announcement;

    fn external_id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        self.title()
    }

    fn page(&self, ctx: &EntityContext<'_>) -> Result<PageProperties, PayloadError> {
        let content = clean_html(self.message());
        AnnouncementPage {
            title: self.title(),
            announcement_id: self.id,
            course: ctx.course_name,
            url: self.html_url(),
            content: &content,
            posted_at: self.posted_at(),
        }
        .into_properties()
    }

    fn message(&self, ctx: &EntityContext<'_>) -> String {
        format!(
            "New announcement:\nTitle: {}\nCourse: {}\nContent: {}\nLink: {}",
            self.title(),
            ctx.course_name,
            clean_html(self.message()),
            self.html_url().unwrap_or("")
        )
    }
}

/// Why a record was not mirrored.
#[derive(Debug, Error)]
pub enum SyncFailure {
    #[error("existence query failed: {0}")]
    Query(#[source] StoreError),
    #[error("invalid payload: {0}")]
    Payload(#[source] PayloadError),
    #[error("create failed: {0}")]
    Create(#[source] StoreError),
}

#[derive(Debug)]
pub enum SyncOutcome {
    Created { page_id: PageId, notified: bool },
    Skipped { existing_page_id: PageId },
    Failed(SyncFailure),
}

impl SyncOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, SyncOutcome::Created { .. })
    }
}

/// Borrowed destination collaborators plus the policy for a failed existence query.
pub struct Pipeline<'a, S: ?Sized, N: ?Sized> {
    store: &'a S,
    notifier: &'a N,
    databases: &'a DatabaseIds,
    on_query_error: DedupePolicy,
}

impl<'a, S, N> Pipeline<'a, S, N>
where
    S: NoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    pub fn new(
        store: &'a S,
        notifier: &'a N,
        databases: &'a DatabaseIds,
        on_query_error: DedupePolicy,
    ) -> Self {
        Pipeline {
            store,
            notifier,
            databases,
            on_query_error,
        }
    }

    pub async fn sync_entity<E: SyncEntity>(
        &self,
        entity: &E,
        ctx: &EntityContext<'_>,
    ) -> SyncOutcome {
        let kind = E::KIND;
        let id = entity.external_id();
        let database_id = kind.database(self.databases);

        match find_existing(self.store, database_id, kind.id_field(), id).await {
            Ok(Some(existing_page_id)) => {
                info!(%kind, id, name = entity.label(), course = ctx.course_name, "Already exists, skipping");
                return SyncOutcome::Skipped { existing_page_id };
            }
            Ok(None) => {}
            Err(e) => match self.on_query_error {
                DedupePolicy::TreatAsAbsent => {
                    warn!(%kind, id, error = %e, "Existence unknown, creating anyway");
                }
                DedupePolicy::SkipRecord => {
                    warn!(%kind, id, error = %e, "Existence unknown, leaving record for the next run");
                    return SyncOutcome::Failed(SyncFailure::Query(e));
                }
            },
        }

        let properties = match entity.page(ctx) {
            Ok(properties) => properties,
            Err(e) => {
                error!(%kind, id, error = %e, "Could not build page payload");
                return SyncOutcome::Failed(SyncFailure::Payload(e));
            }
        };

        let page_id = match self.store.create_page(database_id, &properties).await {
            Ok(page_id) => page_id,
            Err(e) => {
                error!(%kind, id, name = entity.label(), error = %e, "Failed to create page");
                return SyncOutcome::Failed(SyncFailure::Create(e));
            }
        };
        info!(%kind, id, name = entity.label(), course = ctx.course_name, page_id = %page_id, "Created page");

        let notified = notify_best_effort(self.notifier, &entity.message(ctx)).await;
        SyncOutcome::Created { page_id, notified }
    }
}
