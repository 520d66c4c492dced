use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use civicpulse_common::Config;
use civicpulse_engine::{oracle::FixedOracle, ReportIntake, TaskCoordinator};
use civicpulse_notify::{ConnectionRegistry, FanoutWorker, InProcessQueue, Notifier};
use civicpulse_store::MemoryStore;

mod rest;

pub struct AppState {
    pub intake: ReportIntake,
    pub coordinator: TaskCoordinator,
    pub notifier: Arc<Notifier>,
    pub registry: Arc<ConnectionRegistry>,
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("civicpulse=info".parse()?))
        .init();

    let config = Config::from_env();

    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(InProcessQueue::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let notifier = Arc::new(Notifier::new(store.clone(), queue.clone()));

    // Local runs skip the external image-verification service and accept
    // staff proof outright; production wires an HTTP oracle here.
    let oracle = Arc::new(FixedOracle {
        confidence: 1.0,
        reasoning: "verification service not configured".to_string(),
    });

    tokio::spawn(FanoutWorker::new(queue.clone(), registry.clone()).run());

    let state = Arc::new(AppState {
        intake: ReportIntake::new(store.clone()),
        coordinator: TaskCoordinator::new(store, notifier.clone(), oracle),
        notifier,
        registry,
        config: config.clone(),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Citizen report intake
        .route("/reports/{category}", post(rest::reports::submit_report))
        .route("/locality/{check}", post(rest::reports::locality_check))
        .route("/report/resolve", put(rest::reports::self_resolve))
        // Public tracker
        .route("/track/{report_id}", get(rest::track::track_report))
        .route("/track/confirm", post(rest::track::confirm_resolution))
        .route("/track/reject", post(rest::track::reject_resolution))
        // Staff task management
        .route("/staff/tasks/assign", post(rest::staff::assign_task))
        .route("/staff/tasks/start", post(rest::staff::start_task))
        .route("/staff/tasks/resolve", post(rest::staff::resolve_task))
        .route("/staff/tasks/{staff_id}", get(rest::staff::active_tasks))
        .route("/staff/tasks/{staff_id}/history", get(rest::staff::past_tasks))
        // Notifications (the {id} is a user id except for /read, which
        // takes a notification id)
        .route("/notifications/{id}", get(rest::notifications::list))
        .route("/notifications/{id}/read", patch(rest::notifications::mark_read))
        .route("/notifications/{id}/stream", get(rest::notifications::stream))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("CivicPulse API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
