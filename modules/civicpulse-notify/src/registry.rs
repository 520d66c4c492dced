use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

struct LiveEntry {
    token: u64,
    tx: mpsc::UnboundedSender<Value>,
}

/// Process-local registry of live connections: one stream per user.
/// Completeness holds only within a single instance; multi-instance
/// deployments need a shared pub/sub layer, which is out of scope here.
#[derive(Default)]
pub struct ConnectionRegistry {
    clients: Mutex<HashMap<String, LiveEntry>>,
    next_token: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live stream for a user; returns its receiving end and a
    /// token identifying this connection. A second connect for the same
    /// user replaces the first; the stale stream ends when its sender is
    /// dropped here.
    pub async fn connect(&self, user_id: &str) -> (mpsc::UnboundedReceiver<Value>, u64) {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .clients
            .lock()
            .await
            .insert(user_id.to_string(), LiveEntry { token, tx });
        if previous.is_some() {
            debug!(user_id, "replaced existing live connection");
        }
        (rx, token)
    }

    pub async fn disconnect(&self, user_id: &str) {
        self.clients.lock().await.remove(user_id);
    }

    /// Remove the user's entry only while it still belongs to the
    /// connection identified by `token`. A closing stream uses this so it
    /// never tears down a newer connection that replaced it.
    pub async fn disconnect_if_current(&self, user_id: &str, token: u64) {
        let mut clients = self.clients.lock().await;
        if clients.get(user_id).is_some_and(|e| e.token == token) {
            clients.remove(user_id);
        }
    }

    /// Write an event to a user's live stream. Returns false when the user
    /// is offline or their stream has gone away; a normal condition, not
    /// an error.
    pub async fn send_to(&self, user_id: &str, event: Value) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(user_id) {
            Some(entry) => {
                if entry.tx.send(event).is_ok() {
                    true
                } else {
                    // Receiver dropped without a disconnect call.
                    clients.remove(user_id);
                    false
                }
            }
            None => false,
        }
    }

    pub async fn is_connected(&self, user_id: &str) -> bool {
        self.clients.lock().await.contains_key(user_id)
    }
}

// --- Control events ---
//
// Injected into live streams independently of the queue. Anything that
// treats stream payloads as domain events must filter these out.

pub fn connection_ack_event(user_id: &str) -> Value {
    json!({
        "type": "connection_ack",
        "userId": user_id,
        "createdAt": chrono::Utc::now().to_rfc3339(),
    })
}

pub fn heartbeat_event() -> Value {
    json!({
        "type": "heartbeat",
        "createdAt": chrono::Utc::now().to_rfc3339(),
    })
}

pub fn is_control_event(event: &Value) -> bool {
    matches!(
        event.get("type").and_then(Value::as_str),
        Some("heartbeat") | Some("connection_ack")
    )
}
