//! In-memory document store used by tests and local runs.
//!
//! Enumeration order is sorted key order (`BTreeMap`), so duplicate-
//! detection tie-breaking is deterministic against this store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use civicpulse_common::{
    Category, CivicPulseError, Notification, Report, ReportKey, Task, TaskStatus,
};

use crate::traits::{BatchWrite, DocumentStore};

#[derive(Default)]
struct Collections {
    reports: BTreeMap<ReportKey, Report>,
    tasks: BTreeMap<String, Task>,
    notifications: BTreeMap<String, Notification>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_report(&self, key: &ReportKey) -> Result<Option<Report>, CivicPulseError> {
        Ok(self.inner.lock().await.reports.get(key).cloned())
    }

    async fn put_report(&self, key: &ReportKey, report: &Report) -> Result<(), CivicPulseError> {
        self.inner
            .lock()
            .await
            .reports
            .insert(key.clone(), report.clone());
        Ok(())
    }

    async fn list_reports_in_cell(
        &self,
        category: Category,
        geohash: &str,
    ) -> Result<Vec<(ReportKey, Report)>, CivicPulseError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reports
            .iter()
            .filter(|(k, _)| k.category == category && k.geohash == geohash)
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect())
    }

    async fn find_report_by_id(
        &self,
        report_id: &str,
    ) -> Result<Option<(ReportKey, Report)>, CivicPulseError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .reports
            .iter()
            .find(|(k, _)| k.report_id == report_id)
            .map(|(k, r)| (k.clone(), r.clone())))
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, CivicPulseError> {
        Ok(self.inner.lock().await.tasks.get(task_id).cloned())
    }

    async fn find_open_task_for_report(
        &self,
        report_id: &str,
    ) -> Result<Option<Task>, CivicPulseError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .values()
            .find(|t| t.report_id == report_id && !t.status.is_terminal())
            .cloned())
    }

    async fn list_tasks_for_staff(
        &self,
        staff_id: &str,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Task>, CivicPulseError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tasks
            .values()
            .filter(|t| t.assigned_to == staff_id && statuses.contains(&t.status))
            .cloned()
            .collect())
    }

    async fn get_notification(&self, id: &str) -> Result<Option<Notification>, CivicPulseError> {
        Ok(self.inner.lock().await.notifications.get(id).cloned())
    }

    async fn put_notification(&self, notification: &Notification) -> Result<(), CivicPulseError> {
        self.inner
            .lock()
            .await
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn mark_notification_read(&self, id: &str) -> Result<(), CivicPulseError> {
        let mut inner = self.inner.lock().await;
        match inner.notifications.get_mut(id) {
            Some(n) => {
                n.is_read = true;
                Ok(())
            }
            None => Err(CivicPulseError::NotFound(format!("notification {id}"))),
        }
    }

    async fn recent_notifications(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, CivicPulseError> {
        let inner = self.inner.lock().await;
        let mut matching: Vec<Notification> = inner
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn apply_batch(&self, writes: Vec<BatchWrite>) -> Result<(), CivicPulseError> {
        let mut inner = self.inner.lock().await;

        // Verify phase: every Update target must exist before anything is
        // applied, so a failing batch leaves the store untouched.
        for write in &writes {
            match write {
                BatchWrite::UpdateReport { key, .. } => {
                    if !inner.reports.contains_key(key) {
                        return Err(CivicPulseError::NotFound(format!("report {key}")));
                    }
                }
                BatchWrite::UpdateTask(task) => {
                    if !inner.tasks.contains_key(&task.id) {
                        return Err(CivicPulseError::NotFound(format!("task {}", task.id)));
                    }
                }
                _ => {}
            }
        }

        for write in writes {
            match write {
                BatchWrite::PutReport { key, report }
                | BatchWrite::UpdateReport { key, report } => {
                    inner.reports.insert(key, report);
                }
                BatchWrite::PutTask(task) | BatchWrite::UpdateTask(task) => {
                    inner.tasks.insert(task.id.clone(), task);
                }
                BatchWrite::PutNotification(n) => {
                    inner.notifications.insert(n.id.clone(), n);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use civicpulse_common::{GeoPoint, NotificationKind, ReportStatus, Severity};

    fn sample_report(report_id: &str, geohash: &str) -> (ReportKey, Report) {
        let report = Report {
            id: report_id.to_string(),
            category: Category::Waste,
            location: GeoPoint { lat: 12.9716, lng: 77.5946 },
            geohash: geohash.to_string(),
            status: ReportStatus::Open,
            severity: Severity::Medium,
            description: String::new(),
            image_url: None,
            reporter_id: "user-1".to_string(),
            reporter_email: "user-1@example.com".to_string(),
            interested_users: Default::default(),
            upvotes: 1,
            assigned_task_id: None,
            proof_image_url: None,
            resolved_by: None,
            ai_verification: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        (report.key(), report)
    }

    fn sample_notification(id: &str, user: &str, at: chrono::DateTime<Utc>) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: user.to_string(),
            message: "msg".to_string(),
            kind: NotificationKind::Info,
            link: None,
            is_read: false,
            created_at: at,
        }
    }

    #[tokio::test]
    async fn put_then_get_report_round_trips() {
        let store = MemoryStore::new();
        let (key, report) = sample_report("r1", "tdr1u00");
        store.put_report(&key, &report).await.unwrap();
        assert_eq!(store.get_report(&key).await.unwrap(), Some(report));
    }

    #[tokio::test]
    async fn cell_listing_filters_by_category_and_cell() {
        let store = MemoryStore::new();
        let (k1, r1) = sample_report("r1", "tdr1u00");
        let (k2, r2) = sample_report("r2", "tdr1u01");
        store.put_report(&k1, &r1).await.unwrap();
        store.put_report(&k2, &r2).await.unwrap();

        let in_cell = store
            .list_reports_in_cell(Category::Waste, "tdr1u00")
            .await
            .unwrap();
        assert_eq!(in_cell.len(), 1);
        assert_eq!(in_cell[0].1.id, "r1");

        let other_category = store
            .list_reports_in_cell(Category::Fire, "tdr1u00")
            .await
            .unwrap();
        assert!(other_category.is_empty());
    }

    #[tokio::test]
    async fn cell_listing_order_is_stable() {
        let store = MemoryStore::new();
        for id in ["r3", "r1", "r2"] {
            let (k, r) = sample_report(id, "tdr1u00");
            store.put_report(&k, &r).await.unwrap();
        }
        let ids: Vec<String> = store
            .list_reports_in_cell(Category::Waste, "tdr1u00")
            .await
            .unwrap()
            .into_iter()
            .map(|(_, r)| r.id)
            .collect();
        assert_eq!(ids, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn recent_notifications_newest_first_capped() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for i in 0..60 {
            let n = sample_notification(
                &format!("n{i:02}"),
                "u1",
                base + chrono::Duration::seconds(i),
            );
            store.put_notification(&n).await.unwrap();
        }
        let recent = store.recent_notifications("u1", 50).await.unwrap();
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].id, "n59");
        assert_eq!(recent[49].id, "n10");
    }

    #[tokio::test]
    async fn mark_read_is_idempotent() {
        let store = MemoryStore::new();
        let n = sample_notification("n1", "u1", Utc::now());
        store.put_notification(&n).await.unwrap();

        store.mark_notification_read("n1").await.unwrap();
        store.mark_notification_read("n1").await.unwrap();
        assert!(store.get_notification("n1").await.unwrap().unwrap().is_read);
    }

    #[tokio::test]
    async fn mark_read_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.mark_notification_read("nope").await,
            Err(CivicPulseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn failing_batch_applies_nothing() {
        let store = MemoryStore::new();
        let (key, report) = sample_report("r1", "tdr1u00");
        let missing = ReportKey {
            report_id: "ghost".to_string(),
            ..key.clone()
        };

        let result = store
            .apply_batch(vec![
                BatchWrite::PutReport {
                    key: key.clone(),
                    report: report.clone(),
                },
                BatchWrite::UpdateReport {
                    key: missing,
                    report,
                },
            ])
            .await;

        assert!(matches!(result, Err(CivicPulseError::NotFound(_))));
        // The valid Put in the same batch must not have landed.
        assert!(store.get_report(&key).await.unwrap().is_none());
    }
}
