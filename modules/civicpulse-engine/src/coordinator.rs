//! Task coordinator: creates, assigns and resolves staff tasks, driving
//! the backing report through its lifecycle.
//!
//! Every operation applies its task + report + notification-log writes as
//! one atomic batch; the queue publish happens after the commit and is
//! best-effort. A push failure never rolls back a transition.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use civicpulse_common::{
    AiVerification, CivicPulseError, Notification, NotificationKind, Report, ReportKey,
    ReportStatus, Task, TaskPriority, TaskStatus,
};
use civicpulse_notify::Notifier;
use civicpulse_store::{BatchWrite, DocumentStore};

use crate::lifecycle::{check_report_transition, check_task_transition};
use crate::oracle::{ConfidenceOracle, ConfidenceResult, RESOLUTION_CONFIDENCE_THRESHOLD};

#[derive(Debug, Clone)]
pub struct TaskMeta {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
}

pub struct TaskCoordinator {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<Notifier>,
    oracle: Arc<dyn ConfidenceOracle>,
}

impl TaskCoordinator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        notifier: Arc<Notifier>,
        oracle: Arc<dyn ConfidenceOracle>,
    ) -> Self {
        Self {
            store,
            notifier,
            oracle,
        }
    }

    /// Create a task for a report and move the report to ASSIGNED.
    /// Rejected when the report already carries a non-terminal task.
    pub async fn assign_task(
        &self,
        report_key: &ReportKey,
        assigned_to: &str,
        assigned_by: &str,
        meta: TaskMeta,
    ) -> Result<Task, CivicPulseError> {
        if assigned_to.is_empty() || meta.title.is_empty() {
            return Err(CivicPulseError::Validation(
                "assignee and title are required".to_string(),
            ));
        }

        let mut report = self.get_report(report_key).await?;

        // Checked before the transition so a double assignment reports the
        // existing task instead of a status conflict.
        if let Some(existing) = self
            .store
            .find_open_task_for_report(&report.id)
            .await?
        {
            return Err(CivicPulseError::Validation(format!(
                "report {} already has active task {}",
                report.id, existing.id
            )));
        }
        check_report_transition(report.status, ReportStatus::Assigned)?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            report_id: report.id.clone(),
            report_key: report_key.clone(),
            title: meta.title,
            description: meta.description,
            assigned_to: assigned_to.to_string(),
            assigned_by: assigned_by.to_string(),
            status: TaskStatus::Pending,
            priority: meta.priority,
            deadline: meta.deadline,
            proof_image_url: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        report.status = ReportStatus::Assigned;
        report.assigned_task_id = Some(task.id.clone());
        report.updated_at = now;

        let notification = Notifier::build(
            &report.reporter_id,
            format!(
                "Update: Your {} report has been assigned to a staff member.",
                report.category
            ),
            NotificationKind::Info,
            Some(format!("/track/{}", report.id)),
        );

        self.commit_and_push(
            vec![
                BatchWrite::PutTask(task.clone()),
                BatchWrite::UpdateReport {
                    key: report_key.clone(),
                    report,
                },
            ],
            notification,
        )
        .await?;

        info!(task_id = %task.id, report_id = %task.report_id, assigned_to, "task assigned");
        Ok(task)
    }

    /// Staff picks up a pending task.
    pub async fn start_task(&self, task_id: &str) -> Result<(), CivicPulseError> {
        let (mut task, report) = self.get_task_and_report(task_id).await?;
        check_task_transition(task.status, TaskStatus::InProgress)?;

        task.status = TaskStatus::InProgress;
        task.updated_at = Utc::now();

        let notification = Notifier::build(
            &report.reporter_id,
            format!(
                "Update: Work has started on your {} report.",
                report.category
            ),
            NotificationKind::Info,
            Some(format!("/track/{}", report.id)),
        );

        self.commit_and_push(vec![BatchWrite::UpdateTask(task)], notification)
            .await
    }

    /// Staff submits proof of resolution; both entities move to
    /// USERVERIFICATION and the reporter is asked to confirm.
    pub async fn resolve_task(
        &self,
        task_id: &str,
        proof_image_url: &str,
    ) -> Result<(), CivicPulseError> {
        if proof_image_url.is_empty() {
            return Err(CivicPulseError::Validation(
                "proof image is required".to_string(),
            ));
        }

        let (mut task, mut report) = self.get_task_and_report(task_id).await?;
        check_task_transition(task.status, TaskStatus::UserVerification)?;
        check_report_transition(report.status, ReportStatus::UserVerification)?;

        let now = Utc::now();
        task.status = TaskStatus::UserVerification;
        task.proof_image_url = Some(proof_image_url.to_string());
        task.updated_at = now;

        report.status = ReportStatus::UserVerification;
        report.proof_image_url = Some(proof_image_url.to_string());
        report.updated_at = now;

        let notification = Notifier::build(
            &report.reporter_id,
            format!(
                "Update: Your {} report has proof of resolution awaiting your confirmation.",
                report.category
            ),
            NotificationKind::Success,
            Some(format!("/track/{}", report.id)),
        );

        let key = report.key();
        self.commit_and_push(
            vec![
                BatchWrite::UpdateTask(task),
                BatchWrite::UpdateReport { key, report },
            ],
            notification,
        )
        .await
    }

    /// Citizen confirms the staff proof. Terminal for both entities.
    pub async fn confirm_resolution(&self, task_id: &str) -> Result<(), CivicPulseError> {
        let (mut task, mut report) = self.get_task_and_report(task_id).await?;
        check_task_transition(task.status, TaskStatus::Completed)?;
        check_report_transition(report.status, ReportStatus::Resolved)?;

        let now = Utc::now();
        task.status = TaskStatus::Completed;
        task.updated_at = now;
        task.completed_at = Some(now);

        report.status = ReportStatus::Resolved;
        report.resolved_by = Some(task.assigned_to.clone());
        report.updated_at = now;

        let notification = Notifier::build(
            &report.reporter_id,
            format!(
                "Your {} report is now resolved. Thank you for confirming.",
                report.category
            ),
            NotificationKind::Success,
            Some(format!("/track/{}", report.id)),
        );

        let key = report.key();
        self.commit_and_push(
            vec![
                BatchWrite::UpdateTask(task),
                BatchWrite::UpdateReport { key, report },
            ],
            notification,
        )
        .await
    }

    /// Citizen rejects the staff proof: the task returns to the rework
    /// queue with the reason attached and the report's proof is cleared.
    pub async fn reject_resolution(
        &self,
        task_id: &str,
        reason: &str,
    ) -> Result<(), CivicPulseError> {
        if reason.trim().is_empty() {
            return Err(CivicPulseError::Validation(
                "rejection reason is required".to_string(),
            ));
        }

        let (mut task, mut report) = self.get_task_and_report(task_id).await?;
        check_task_transition(task.status, TaskStatus::Pending)?;
        check_report_transition(report.status, ReportStatus::Assigned)?;

        let now = Utc::now();
        task.status = TaskStatus::Pending;
        task.rejection_reason = Some(reason.to_string());
        task.proof_image_url = None;
        task.updated_at = now;

        report.status = ReportStatus::Assigned;
        report.proof_image_url = None;
        report.rejection_reason = Some(reason.to_string());
        report.updated_at = now;

        // The staff member gets the rework notice, not the reporter who
        // triggered it.
        let notification = Notifier::build(
            &task.assigned_to,
            format!(
                "Resolution rejected by the reporter: {reason}. The task is back in your queue."
            ),
            NotificationKind::Error,
            Some(format!("/track/{}", report.id)),
        );

        let key = report.key();
        self.commit_and_push(
            vec![
                BatchWrite::UpdateTask(task),
                BatchWrite::UpdateReport { key, report },
            ],
            notification,
        )
        .await
    }

    /// AI-gated resolution: the confidence oracle compares the original
    /// report photo with the staff proof. At or above the threshold this
    /// resolves both entities in one batch; below it, nothing changes and
    /// the caller gets the rejection (no automatic retry).
    pub async fn resolve_with_verification(
        &self,
        task_id: &str,
        proof_image_url: &str,
    ) -> Result<ConfidenceResult, CivicPulseError> {
        if proof_image_url.is_empty() {
            return Err(CivicPulseError::Validation(
                "proof image is required".to_string(),
            ));
        }

        let (mut task, mut report) = self.get_task_and_report(task_id).await?;
        check_task_transition(task.status, TaskStatus::Resolved)?;
        check_report_transition(report.status, ReportStatus::Resolved)?;

        let before = report.image_url.clone().ok_or_else(|| {
            CivicPulseError::Validation(format!(
                "report {} has no original image to verify against",
                report.id
            ))
        })?;

        let result = self
            .oracle
            .verify_resolution(&before, proof_image_url)
            .await?;

        if result.confidence < RESOLUTION_CONFIDENCE_THRESHOLD {
            info!(
                task_id,
                confidence = result.confidence,
                "verification below threshold; no state change"
            );
            return Err(CivicPulseError::LowConfidenceRejection {
                confidence: result.confidence,
                reasoning: result.reasoning,
            });
        }

        let now = Utc::now();
        task.status = TaskStatus::Resolved;
        task.proof_image_url = Some(proof_image_url.to_string());
        task.updated_at = now;
        task.completed_at = Some(now);

        report.status = ReportStatus::Resolved;
        report.proof_image_url = Some(proof_image_url.to_string());
        report.resolved_by = Some(task.assigned_to.clone());
        report.ai_verification = Some(AiVerification {
            verified: true,
            confidence: result.confidence,
            reasoning: result.reasoning.clone(),
        });
        report.updated_at = now;

        let notification = Notifier::build(
            &report.reporter_id,
            format!(
                "Update: Your {} report has been resolved. Click to view proof.",
                report.category
            ),
            NotificationKind::Success,
            Some(format!("/track/{}", report.id)),
        );

        let key = report.key();
        self.commit_and_push(
            vec![
                BatchWrite::UpdateTask(task),
                BatchWrite::UpdateReport { key, report },
            ],
            notification,
        )
        .await?;

        Ok(result)
    }

    /// Citizen marks their own report resolved. Only the original reporter
    /// may do this, and only from VERIFIED, ASSIGNED or USERVERIFICATION.
    /// Any linked non-terminal task is closed out in the same batch.
    pub async fn self_resolve(
        &self,
        report_id: &str,
        user_id: &str,
    ) -> Result<(), CivicPulseError> {
        let (key, mut report) = self
            .store
            .find_report_by_id(report_id)
            .await?
            .ok_or_else(|| CivicPulseError::NotFound(format!("report {report_id}")))?;

        if report.reporter_id != user_id {
            return Err(CivicPulseError::Validation(
                "only the original reporter may resolve this report".to_string(),
            ));
        }
        check_report_transition(report.status, ReportStatus::Resolved)?;

        let now = Utc::now();
        report.status = ReportStatus::Resolved;
        report.resolved_by = Some(user_id.to_string());
        report.updated_at = now;

        let mut writes = Vec::new();
        if let Some(mut task) = self.store.find_open_task_for_report(report_id).await? {
            check_task_transition(task.status, TaskStatus::Resolved)?;
            task.status = TaskStatus::Resolved;
            task.updated_at = now;
            task.completed_at = Some(now);
            writes.push(BatchWrite::UpdateTask(task));
        }

        let notification = Notifier::build(
            &report.reporter_id,
            format!("You marked your {} report as resolved.", report.category),
            NotificationKind::Info,
            Some(format!("/track/{}", report.id)),
        );

        writes.push(BatchWrite::UpdateReport { key, report });
        self.commit_and_push(writes, notification).await
    }

    /// Tasks currently on a staff member's plate.
    pub async fn active_tasks(&self, staff_id: &str) -> Result<Vec<Task>, CivicPulseError> {
        self.store
            .list_tasks_for_staff(staff_id, &[TaskStatus::Pending, TaskStatus::InProgress])
            .await
    }

    /// A staff member's closed-out tasks.
    pub async fn past_tasks(&self, staff_id: &str) -> Result<Vec<Task>, CivicPulseError> {
        self.store
            .list_tasks_for_staff(
                staff_id,
                &[
                    TaskStatus::Completed,
                    TaskStatus::Verified,
                    TaskStatus::Resolved,
                ],
            )
            .await
    }

    // --- helpers ---

    async fn get_report(&self, key: &ReportKey) -> Result<Report, CivicPulseError> {
        self.store
            .get_report(key)
            .await?
            .ok_or_else(|| CivicPulseError::NotFound(format!("report {key}")))
    }

    async fn get_task_and_report(
        &self,
        task_id: &str,
    ) -> Result<(Task, Report), CivicPulseError> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or_else(|| CivicPulseError::NotFound(format!("task {task_id}")))?;
        let report = self.get_report(&task.report_key).await?;
        Ok((task, report))
    }

    /// Apply entity writes plus the notification-log append atomically,
    /// then publish the envelope. The publish is best-effort.
    async fn commit_and_push(
        &self,
        mut writes: Vec<BatchWrite>,
        notification: Notification,
    ) -> Result<(), CivicPulseError> {
        writes.push(BatchWrite::PutNotification(notification.clone()));
        self.store.apply_batch(writes).await?;
        self.notifier.publish(&notification).await;
        Ok(())
    }
}
