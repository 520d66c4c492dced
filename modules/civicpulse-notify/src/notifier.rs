use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use civicpulse_common::{CivicPulseError, Notification, NotificationKind};
use civicpulse_store::DocumentStore;

use crate::queue::DeliveryQueue;

/// Writes the durable notification log and publishes envelopes for live
/// fanout. The log write is authoritative; the publish is a nudge.
pub struct Notifier {
    store: Arc<dyn DocumentStore>,
    queue: Arc<dyn DeliveryQueue>,
}

impl Notifier {
    pub fn new(store: Arc<dyn DocumentStore>, queue: Arc<dyn DeliveryQueue>) -> Self {
        Self { store, queue }
    }

    /// Build a fresh unread notification. Callers that need the log write
    /// inside an atomic batch use this and publish after the commit.
    pub fn build(
        user_id: &str,
        message: impl Into<String>,
        kind: NotificationKind,
        link: Option<String>,
    ) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            message: message.into(),
            kind,
            link,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Append to the persisted log, then publish for asynchronous fanout.
    /// Publish failure is absorbed: the log is the authoritative fallback
    /// and a degraded push must not fail the caller.
    pub async fn enqueue(
        &self,
        user_id: &str,
        message: impl Into<String>,
        kind: NotificationKind,
        link: Option<String>,
    ) -> Result<Notification, CivicPulseError> {
        let notification = Self::build(user_id, message, kind, link);
        self.store.put_notification(&notification).await?;
        self.publish(&notification).await;
        Ok(notification)
    }

    /// Publish an already-persisted notification to the delivery queue.
    /// Best-effort: failures are logged and swallowed.
    pub async fn publish(&self, notification: &Notification) {
        let payload = match serde_json::to_vec(notification) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, id = %notification.id, "failed to serialize notification envelope");
                return;
            }
        };
        if let Err(e) = self.queue.publish(payload).await {
            warn!(error = %e, id = %notification.id, "failed to publish notification to queue");
        }
    }

    /// Idempotent read acknowledgement.
    pub async fn mark_read(&self, notification_id: &str) -> Result<(), CivicPulseError> {
        self.store.mark_notification_read(notification_id).await
    }

    /// Persisted history for a user, newest first, capped at `limit`.
    pub async fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, CivicPulseError> {
        self.store.recent_notifications(user_id, limit).await
    }
}
