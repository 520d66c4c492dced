//! Notification fanout pipeline.
//!
//! `Notifier::enqueue` appends to the durable notification log and then
//! publishes the envelope to the delivery queue. The `FanoutWorker`
//! consumes one envelope at a time and pushes it to the recipient's live
//! stream if they are connected; offline recipients recover from the
//! persisted log on reconnect; the queue is not a replay log.

pub mod notifier;
pub mod queue;
pub mod registry;
pub mod worker;

pub use notifier::Notifier;
pub use queue::{DeliveryQueue, InProcessQueue};
pub use registry::{connection_ack_event, heartbeat_event, is_control_event, ConnectionRegistry};
pub use worker::FanoutWorker;
