use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use civicpulse_common::CivicPulseError;

/// The durable at-least-once delivery queue the pipeline publishes to.
/// Receipt from `consume` is the acknowledgement: a consumed message is
/// never redelivered, whatever the delivery step then does with it.
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), CivicPulseError>;

    /// Block until the next message arrives. `None` means the queue has
    /// shut down and the consumer should exit.
    async fn consume(&self) -> Option<Vec<u8>>;
}

/// In-process queue backed by an unbounded channel. Stands in for the
/// external broker in tests and single-instance deployments; a broker
/// adapter implements the same trait without touching the worker.
pub struct InProcessQueue {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl InProcessQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl Default for InProcessQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InProcessQueue {
    async fn publish(&self, payload: Vec<u8>) -> Result<(), CivicPulseError> {
        self.tx
            .send(payload)
            .map_err(|_| CivicPulseError::Queue("queue receiver dropped".to_string()))
    }

    async fn consume(&self) -> Option<Vec<u8>> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_consume_in_order() {
        let queue = InProcessQueue::new();
        queue.publish(b"one".to_vec()).await.unwrap();
        queue.publish(b"two".to_vec()).await.unwrap();
        assert_eq!(queue.consume().await.unwrap(), b"one");
        assert_eq!(queue.consume().await.unwrap(), b"two");
    }
}
