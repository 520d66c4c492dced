use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, Sse},
        IntoResponse, Json,
    },
};
use futures::Stream;
use serde_json::Value;
use tracing::debug;

use civicpulse_notify::{connection_ack_event, heartbeat_event, ConnectionRegistry};

use crate::rest::error_response;
use crate::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// `GET /notifications/{user_id}`: persisted history, newest first, as a
/// bare JSON array.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state
        .notifier
        .recent(&user_id, state.config.notification_page_size)
        .await
    {
        Ok(notifications) => Json(notifications).into_response(),
        Err(e) => error_response(e),
    }
}

/// `PATCH /notifications/{notification_id}/read`
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(notification_id): Path<String>,
) -> impl IntoResponse {
    match state.notifier.mark_read(&notification_id).await {
        Ok(()) => Json(serde_json::json!({"isRead": true})).into_response(),
        Err(e) => error_response(e),
    }
}

fn sse_event(value: &Value) -> Event {
    Event::default().data(value.to_string())
}

/// Removes this connection's registry entry when the stream is dropped,
/// whether the client disconnected or a newer connection replaced it. The
/// token check means a stale teardown never touches the replacement.
struct StreamGuard {
    registry: Arc<ConnectionRegistry>,
    user_id: String,
    token: u64,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        let registry = self.registry.clone();
        let user_id = std::mem::take(&mut self.user_id);
        let token = self.token;
        tokio::spawn(async move {
            registry.disconnect_if_current(&user_id, token).await;
            debug!(user_id, "live notification stream closed");
        });
    }
}

/// `GET /notifications/{user_id}/stream`: the live SSE channel. Opens with
/// a `connection_ack` control event, then interleaves fanned-out
/// notifications with periodic `heartbeat` control events. The stream ends
/// only when the client goes away or a newer connection for the same user
/// replaces this one.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (mut rx, token) = state.registry.connect(&user_id).await;
    debug!(user_id, "live notification stream opened");

    let guard = StreamGuard {
        registry: state.registry.clone(),
        user_id: user_id.clone(),
        token,
    };

    let stream = async_stream::stream! {
        // Owned by the generator; dropping the stream mid-await still runs
        // the teardown.
        let _guard = guard;

        yield Ok(sse_event(&connection_ack_event(&user_id)));

        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        // The first tick fires immediately; the ack above already covers it.
        heartbeat.tick().await;

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(event) => yield Ok(sse_event(&event)),
                    // Sender gone: a newer connection replaced this one.
                    None => break,
                },
                _ = heartbeat.tick() => yield Ok(sse_event(&heartbeat_event())),
            }
        }
    };

    Sse::new(stream)
}
