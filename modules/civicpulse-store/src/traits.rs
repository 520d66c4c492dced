use async_trait::async_trait;

use civicpulse_common::{
    Category, CivicPulseError, Notification, Report, ReportKey, Task, TaskStatus,
};

/// One write in an atomic batch. `Put*` variants upsert; `Update*` variants
/// require the target document to exist and fail the whole batch otherwise.
#[derive(Debug, Clone)]
pub enum BatchWrite {
    PutReport { key: ReportKey, report: Report },
    UpdateReport { key: ReportKey, report: Report },
    PutTask(Task),
    UpdateTask(Task),
    PutNotification(Notification),
}

/// Narrow interface over the external document store. Multi-document
/// lifecycle updates go through `apply_batch`, which must be atomic:
/// either every write lands or none do.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- Reports ---

    async fn get_report(&self, key: &ReportKey) -> Result<Option<Report>, CivicPulseError>;

    async fn put_report(&self, key: &ReportKey, report: &Report) -> Result<(), CivicPulseError>;

    /// All reports of a category within one geohash cell, in stable
    /// enumeration order. Dedup tie-breaking is only deterministic if this
    /// order is stable; implementations must document theirs.
    async fn list_reports_in_cell(
        &self,
        category: Category,
        geohash: &str,
    ) -> Result<Vec<(ReportKey, Report)>, CivicPulseError>;

    /// Collection-group lookup by report id (the tracker path, where the
    /// caller only holds the id).
    async fn find_report_by_id(
        &self,
        report_id: &str,
    ) -> Result<Option<(ReportKey, Report)>, CivicPulseError>;

    // --- Tasks ---

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CivicPulseError>;

    /// The non-terminal task backing a report, if any. At most one exists
    /// at a time; that invariant is enforced by the coordinator.
    async fn find_open_task_for_report(
        &self,
        report_id: &str,
    ) -> Result<Option<Task>, CivicPulseError>;

    async fn list_tasks_for_staff(
        &self,
        staff_id: &str,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Task>, CivicPulseError>;

    // --- Notifications ---

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, CivicPulseError>;

    async fn put_notification(&self, notification: &Notification) -> Result<(), CivicPulseError>;

    /// Flip `is_read`. Idempotent: marking an already-read notification is
    /// a no-op, not an error.
    async fn mark_notification_read(&self, id: &str) -> Result<(), CivicPulseError>;

    /// Most recent notifications for a user, newest first, capped at
    /// `limit`.
    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, CivicPulseError>;

    // --- Atomic multi-document writes ---

    async fn apply_batch(&self, writes: Vec<BatchWrite>) -> Result<(), CivicPulseError>;
}
