//! Route definitions for web server.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::mailbox::Mailbox;
use crate::store::LogStore;

use super::api;

/// Shared handler state.
pub struct AppState {
    pub mailbox: Mailbox,
    pub log: LogStore,
}

/// Create the API router.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Mailboxes
        .route("/agents", get(api::list_agents).post(api::register_agent))
        .route("/agents/:name/status", get(api::agent_status))
        .route("/agents/:name/tasks", post(api::create_task))
        .route("/agents/:name/responses/:job_id", get(api::read_response))

        // Artifacts
        .route("/artifacts/:job_id", post(api::store_artifact))

        // Meeting log
        .route("/log", get(api::read_log))
}

/// Create the full app router.
pub fn create_app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", create_api_router())
        .route("/health", get(health_check))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
