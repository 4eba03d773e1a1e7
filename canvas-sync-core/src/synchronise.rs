//! High-level run: discover courses, then mirror each course's content.
//!
//! The run is a single linear pass:
//!
//! ```text
//! fetch courses ─┬─ none: done
//!                └─ for each course:
//!                     sync course → assignments → files → announcements
//! ```
//!
//! Nothing here is fatal. A failed fetch is logged and treated as "no data",
//! a failed record is logged and counted, and the run always reaches the end
//! with a [`SynchroniseReport`]. Re-running is safe because every record is
//! checked against the destination before it is created.

use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::contract::{CourseSource, NoteStore, Notifier};
use crate::errors::SourceError;
use crate::pipeline::{EntityContext, EntityKind, Pipeline, SyncEntity, SyncOutcome};

/// Per-kind tally of record outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindReport {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Created records whose notification did not go out.
    pub unnotified: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SynchroniseReport {
    pub courses_seen: usize,
    pub courses: KindReport,
    pub assignments: KindReport,
    pub files: KindReport,
    pub announcements: KindReport,
    /// Course listing or per-course fetches that failed.
    pub fetch_failures: usize,
}

impl SynchroniseReport {
    pub fn kind(&self, kind: EntityKind) -> &KindReport {
        match kind {
            EntityKind::Course => &self.courses,
            EntityKind::Assignment => &self.assignments,
            EntityKind::File => &self.files,
            EntityKind::Announcement => &self.announcements,
        }
    }

    fn kind_mut(&mut self, kind: EntityKind) -> &mut KindReport {
        match kind {
            EntityKind::Course => &mut self.courses,
            EntityKind::Assignment => &mut self.assignments,
            EntityKind::File => &mut self.files,
            EntityKind::Announcement => &mut self.announcements,
        }
    }

    fn record(&mut self, kind: EntityKind, outcome: &SyncOutcome) {
        let tally = self.kind_mut(kind);
        match outcome {
            SyncOutcome::Created { notified, .. } => {
                tally.created += 1;
                if !notified {
                    tally.unnotified += 1;
                }
            }
            SyncOutcome::Skipped { .. } => tally.skipped += 1,
            SyncOutcome::Failed(_) => tally.failed += 1,
        }
    }

    pub fn total_created(&self) -> usize {
        self.courses.created + self.assignments.created + self.files.created + self.announcements.created
    }

    pub fn total_failed(&self) -> usize {
        self.courses.failed + self.assignments.failed + self.files.failed + self.announcements.failed
    }
}

/// Runs one full synchronisation pass and returns what happened.
pub async fn synchronise<C, S, N>(
    config: &SyncConfig,
    source: &C,
    store: &S,
    notifier: &N,
) -> SynchroniseReport
where
    C: CourseSource + ?Sized,
    S: NoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    info!("[SYNC] Starting synchronisation run");
    let mut report = SynchroniseReport::default();
    let pipeline = Pipeline::new(store, notifier, &config.databases, config.on_query_error);

    let listing = source.list_active_courses().await;
    if let Some(e) = &listing.interrupted {
        error!(error = %e, fetched = listing.items.len(), "[SYNC] Course listing stopped early");
        report.fetch_failures += 1;
    }
    let courses = listing.items;
    if courses.is_empty() {
        warn!("[SYNC] No courses returned by the LMS");
        return report;
    }
    info!(count = courses.len(), "[SYNC] Courses to synchronise");
    report.courses_seen = courses.len();

    for course in &courses {
        let ctx = EntityContext {
            course_name: course.name(),
            web_url: &config.canvas.web_url,
        };
        info!(course_id = course.id, course = ctx.course_name, "[SYNC] Synchronising course");

        let outcome = pipeline.sync_entity(course, &ctx).await;
        report.record(EntityKind::Course, &outcome);

        let assignments = source.list_assignments(course.id).await;
        sync_all(&pipeline, &ctx, course.id, assignments, &mut report).await;

        let files = source.list_files(course.id).await;
        sync_all(&pipeline, &ctx, course.id, files, &mut report).await;

        let announcements = source.list_announcements(course.id).await;
        sync_all(&pipeline, &ctx, course.id, announcements, &mut report).await;
    }

    info!(
        courses = report.courses_seen,
        created = report.total_created(),
        failed = report.total_failed(),
        "[SYNC] Synchronisation run finished"
    );
    report
}

async fn sync_all<E, S, N>(
    pipeline: &Pipeline<'_, S, N>,
    ctx: &EntityContext<'_>,
    course_id: u64,
    fetched: Result<Vec<E>, SourceError>,
    report: &mut SynchroniseReport,
) where
    E: SyncEntity,
    S: NoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    let kind = E::KIND;
    let records = match fetched {
        Ok(records) => records,
        Err(e) => {
            error!(%kind, course_id, course = ctx.course_name, error = %e, "[SYNC] Fetch failed, treating as empty");
            report.fetch_failures += 1;
            return;
        }
    };
    info!(%kind, course_id, count = records.len(), "[SYNC] Fetched records");
    for record in &records {
        let outcome = pipeline.sync_entity(record, ctx).await;
        report.record(kind, &outcome);
    }
}
