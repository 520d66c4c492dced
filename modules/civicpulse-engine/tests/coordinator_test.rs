//! End-to-end lifecycle scenarios against the in-memory store.

use std::sync::Arc;

use civicpulse_common::{
    Category, CivicPulseError, GeoPoint, NotificationKind, ReportKey, ReportStatus, Severity,
    TaskPriority, TaskStatus,
};
use civicpulse_engine::oracle::FixedOracle;
use civicpulse_engine::{
    NewReport, ReportIntake, SubmissionOutcome, TaskCoordinator, TaskMeta,
};
use civicpulse_notify::{InProcessQueue, Notifier};
use civicpulse_store::{DocumentStore, MemoryStore};

struct Harness {
    store: Arc<MemoryStore>,
    coordinator: TaskCoordinator,
    intake: ReportIntake,
}

fn harness_with_oracle(confidence: f64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(InProcessQueue::new());
    let notifier = Arc::new(Notifier::new(store.clone(), queue));
    let oracle = Arc::new(FixedOracle {
        confidence,
        reasoning: "area appears clear".to_string(),
    });
    Harness {
        store: store.clone(),
        coordinator: TaskCoordinator::new(store.clone(), notifier, oracle),
        intake: ReportIntake::new(store),
    }
}

fn harness() -> Harness {
    harness_with_oracle(0.95)
}

async fn submit_report(h: &Harness, category: Category) -> ReportKey {
    let outcome = h
        .intake
        .submit(NewReport {
            category,
            location: GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            },
            severity: Severity::High,
            description: "overflowing bin near the market".to_string(),
            image_url: Some("https://img.example/before.jpg".to_string()),
            reporter_id: "citizen-1".to_string(),
            reporter_email: "citizen-1@example.com".to_string(),
            content_verified: false,
        })
        .await
        .unwrap();
    match outcome {
        SubmissionOutcome::Created { key, .. } => key,
        SubmissionOutcome::Duplicate { .. } => panic!("unexpected duplicate"),
    }
}

fn meta(title: &str) -> TaskMeta {
    TaskMeta {
        title: title.to_string(),
        description: String::new(),
        priority: TaskPriority::Medium,
        deadline: None,
    }
}

async fn notification_count(h: &Harness, user_id: &str) -> usize {
    h.store.recent_notifications(user_id, 50).await.unwrap().len()
}

#[tokio::test]
async fn assign_moves_report_to_assigned_and_notifies_reporter() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;

    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Pending);
    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Assigned);
    assert_eq!(report.assigned_task_id.as_deref(), Some(task.id.as_str()));

    let notifications = h.store.recent_notifications("citizen-1", 50).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Info);
    assert!(!notifications[0].is_read);
}

#[tokio::test]
async fn second_assignment_is_rejected_with_no_new_task() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;

    let first = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();

    let err = h
        .coordinator
        .assign_task(&key, "staff-2", "admin-1", meta("Clear it again"))
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::Validation(_)));

    // The open task is still the first one, and the report still points
    // at it.
    let open = h
        .store
        .find_open_task_for_report(&key.report_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.id, first.id);
    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.assigned_task_id.as_deref(), Some(first.id.as_str()));
    // No second assignment notification was logged.
    assert_eq!(notification_count(&h, "citizen-1").await, 1);
}

#[tokio::test]
async fn staff_proof_moves_both_to_userverification() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();

    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();

    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::UserVerification);
    // Surfaced to the citizen as WAITING_APPROVAL.
    assert_eq!(report.status.display_status(), "WAITING_APPROVAL");
    assert_eq!(
        report.proof_image_url.as_deref(),
        Some("https://img.example/proof.jpg")
    );

    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::UserVerification);

    let notifications = h.store.recent_notifications("citizen-1", 50).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(
        notifications[0].link.as_deref(),
        Some(format!("/track/{}", key.report_id).as_str())
    );
}

#[tokio::test]
async fn citizen_confirmation_is_terminal() {
    let h = harness();
    let key = submit_report(&h, Category::Water).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Fix the leak"))
        .await
        .unwrap();
    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();

    h.coordinator.confirm_resolution(&task.id).await.unwrap();

    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Resolved);
    assert_eq!(report.resolved_by.as_deref(), Some("staff-1"));
    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::Completed);
    assert!(stored_task.completed_at.is_some());

    // Nothing may move after the terminal transition.
    let err = h
        .coordinator
        .resolve_task(&task.id, "https://img.example/late.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::InvalidTransition { .. }));
}

#[tokio::test]
async fn rejection_returns_task_to_rework_queue() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();
    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();

    h.coordinator
        .reject_resolution(&task.id, "still dirty")
        .await
        .unwrap();

    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::Pending);
    assert_eq!(stored_task.rejection_reason.as_deref(), Some("still dirty"));

    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Assigned);
    assert!(report.proof_image_url.is_none());

    // The rework notice went to the staff member.
    assert_eq!(notification_count(&h, "staff-1").await, 1);

    // Rework loop: staff can submit new proof again.
    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof2.jpg")
        .await
        .unwrap();
}

#[tokio::test]
async fn rejection_requires_a_reason() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();
    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();

    let err = h
        .coordinator
        .reject_resolution(&task.id, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::Validation(_)));
    // No mutation happened.
    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::UserVerification);
}

#[tokio::test]
async fn high_confidence_verification_resolves_atomically() {
    let h = harness_with_oracle(0.92);
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();

    let result = h
        .coordinator
        .resolve_with_verification(&task.id, "https://img.example/after.jpg")
        .await
        .unwrap();
    assert!((result.confidence - 0.92).abs() < f64::EPSILON);

    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Resolved);
    let ai = report.ai_verification.unwrap();
    assert!(ai.verified);
    assert!((ai.confidence - 0.92).abs() < f64::EPSILON);

    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::Resolved);
}

#[tokio::test]
async fn low_confidence_verification_changes_nothing() {
    let h = harness_with_oracle(0.45);
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();
    let notifications_before = notification_count(&h, "citizen-1").await;

    let err = h
        .coordinator
        .resolve_with_verification(&task.id, "https://img.example/after.jpg")
        .await
        .unwrap_err();
    let CivicPulseError::LowConfidenceRejection { confidence, .. } = err else {
        panic!("expected low-confidence rejection, got {err}");
    };
    assert!((confidence - 0.45).abs() < f64::EPSILON);

    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Assigned);
    assert!(report.ai_verification.is_none());
    let stored_task = h.store.get_task(&task.id).await.unwrap().unwrap();
    assert_eq!(stored_task.status, TaskStatus::Pending);
    assert_eq!(notification_count(&h, "citizen-1").await, notifications_before);
}

#[tokio::test]
async fn self_resolve_requires_original_reporter() {
    let h = harness();
    let key = submit_report(&h, Category::Electricity).await;
    h.coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Replace the pole"))
        .await
        .unwrap();

    let err = h
        .coordinator
        .self_resolve(&key.report_id, "someone-else")
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::Validation(_)));

    h.coordinator
        .self_resolve(&key.report_id, "citizen-1")
        .await
        .unwrap();
    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Resolved);
    // The open task was closed out in the same operation.
    assert!(h
        .store
        .find_open_task_for_report(&key.report_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn self_resolve_from_open_is_rejected() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;

    let err = h
        .coordinator
        .self_resolve(&key.report_id, "citizen-1")
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::InvalidTransition { .. }));
    let report = h.store.get_report(&key).await.unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Open);
}

#[tokio::test]
async fn every_transition_logs_exactly_one_notification() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;

    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();
    assert_eq!(notification_count(&h, "citizen-1").await, 1);

    h.coordinator.start_task(&task.id).await.unwrap();
    assert_eq!(notification_count(&h, "citizen-1").await, 2);

    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();
    assert_eq!(notification_count(&h, "citizen-1").await, 3);

    h.coordinator.confirm_resolution(&task.id).await.unwrap();
    assert_eq!(notification_count(&h, "citizen-1").await, 4);
}

#[tokio::test]
async fn staff_task_queries_split_active_and_past() {
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();

    let active = h.coordinator.active_tasks("staff-1").await.unwrap();
    assert_eq!(active.len(), 1);
    assert!(h.coordinator.past_tasks("staff-1").await.unwrap().is_empty());

    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();
    h.coordinator.confirm_resolution(&task.id).await.unwrap();

    assert!(h.coordinator.active_tasks("staff-1").await.unwrap().is_empty());
    let past = h.coordinator.past_tasks("staff-1").await.unwrap();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0].status, TaskStatus::Completed);
}

#[tokio::test]
async fn assign_to_missing_report_is_not_found() {
    let h = harness();
    let key = ReportKey {
        category: Category::Waste,
        geohash: "tdr1u00".to_string(),
        reporter_id: "nobody".to_string(),
        report_id: "missing".to_string(),
    };
    let err = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap_err();
    assert!(matches!(err, CivicPulseError::NotFound(_)));
}

#[tokio::test]
async fn reassignment_after_resolution_starts_a_fresh_cycle() {
    // A resolved waste report does not block re-reporting, and the new
    // report is assignable independently of the old one.
    let h = harness();
    let key = submit_report(&h, Category::Waste).await;
    let task = h
        .coordinator
        .assign_task(&key, "staff-1", "admin-1", meta("Clear the bin"))
        .await
        .unwrap();
    h.coordinator
        .resolve_task(&task.id, "https://img.example/proof.jpg")
        .await
        .unwrap();
    h.coordinator.confirm_resolution(&task.id).await.unwrap();

    // Same spot, same category: the resolved report is excluded from
    // dedup, so this creates a fresh OPEN report.
    let outcome = h
        .intake
        .submit(NewReport {
            category: Category::Waste,
            location: GeoPoint {
                lat: 12.9716,
                lng: 77.5946,
            },
            severity: Severity::Medium,
            description: "the pile is back".to_string(),
            image_url: None,
            reporter_id: "citizen-2".to_string(),
            reporter_email: "citizen-2@example.com".to_string(),
            content_verified: false,
        })
        .await
        .unwrap();
    let SubmissionOutcome::Created { key: new_key, status } = outcome else {
        panic!("expected a fresh report");
    };
    assert_eq!(status, ReportStatus::Open);
    assert_ne!(new_key.report_id, key.report_id);

    h.coordinator
        .assign_task(&new_key, "staff-2", "admin-1", meta("Clear it again"))
        .await
        .unwrap();
}
