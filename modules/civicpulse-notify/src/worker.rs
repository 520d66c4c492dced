use std::sync::Arc;

use tracing::{debug, warn};

use civicpulse_common::Notification;

use crate::queue::DeliveryQueue;
use crate::registry::ConnectionRegistry;

/// Queue consumer: pulls one envelope at a time and writes it to the
/// recipient's live stream when they are online. The message is
/// acknowledged either way; reconnecting clients recover missed events
/// from the persisted log, never from redelivery.
pub struct FanoutWorker {
    queue: Arc<dyn DeliveryQueue>,
    registry: Arc<ConnectionRegistry>,
}

impl FanoutWorker {
    pub fn new(queue: Arc<dyn DeliveryQueue>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { queue, registry }
    }

    /// Run until the queue shuts down.
    pub async fn run(self) {
        while let Some(payload) = self.queue.consume().await {
            self.deliver(&payload).await;
        }
        debug!("notification queue closed; fanout worker exiting");
    }

    async fn deliver(&self, payload: &[u8]) {
        // Malformed payloads are dropped, not retried: a poison message
        // must not wedge the loop.
        let envelope: Notification = match serde_json::from_slice(payload) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "dropping malformed queue payload");
                return;
            }
        };

        let event = match serde_json::to_value(&envelope) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, id = %envelope.id, "dropping unserializable envelope");
                return;
            }
        };

        if self.registry.send_to(&envelope.user_id, event).await {
            debug!(user_id = %envelope.user_id, id = %envelope.id, "pushed notification to live stream");
        } else {
            debug!(user_id = %envelope.user_id, id = %envelope.id, "user offline; message acknowledged");
        }
    }
}
