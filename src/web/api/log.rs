//! Read-only view of the meeting log.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::protocol::LogEntry;
use crate::web::router::AppState;

use super::error::ApiError;

/// Parsed log entries in file order. Text before the first marker is left out.
pub async fn read_log(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    Ok(Json(state.log.entries()?))
}
