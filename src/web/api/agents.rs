//! API endpoints for agent mailboxes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::mailbox::{MailboxStatus, Priority, ResponseState};
use crate::web::router::AppState;

use super::error::ApiError;

/// Register agent request.
#[derive(Deserialize)]
pub struct RegisterAgentRequest {
    pub agent_name: String,
}

/// Create task request.
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub job_id: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
}

/// Message returned by write operations.
#[derive(Serialize)]
pub struct Confirmation {
    pub message: String,
    pub path: String,
}

/// List registered agents.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.mailbox.list_agents()?))
}

/// Register an agent (creates its inbox and outbox).
pub async fn register_agent(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterAgentRequest>,
) -> Result<(StatusCode, Json<Confirmation>), ApiError> {
    let dir = state.mailbox.register_agent(&payload.agent_name)?;
    Ok((
        StatusCode::CREATED,
        Json(Confirmation {
            message: format!("Agent {} registered", payload.agent_name),
            path: dir.display().to_string(),
        }),
    ))
}

/// Inbox and outbox counts for one agent.
pub async fn agent_status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<MailboxStatus>, ApiError> {
    Ok(Json(state.mailbox.status(&name)?))
}

/// Drop a task into an agent's inbox.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Confirmation>), ApiError> {
    let path = state.mailbox.create_task(
        &name,
        &payload.job_id,
        &payload.content,
        payload.priority,
    )?;
    Ok((
        StatusCode::CREATED,
        Json(Confirmation {
            message: format!("Task {} created for {}", payload.job_id, name),
            path: path.display().to_string(),
        }),
    ))
}

/// Read an agent's response for a job; pending jobs are not an error.
pub async fn read_response(
    State(state): State<Arc<AppState>>,
    Path((name, job_id)): Path<(String, String)>,
) -> Result<Json<ResponseState>, ApiError> {
    Ok(Json(state.mailbox.read_response(&name, &job_id)?))
}
