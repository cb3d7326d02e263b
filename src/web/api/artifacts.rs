//! API endpoint for job artifacts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::web::router::AppState;

use super::agents::Confirmation;
use super::error::ApiError;

#[derive(Deserialize)]
pub struct StoreArtifactRequest {
    pub filename: String,
    pub content: String,
}

pub async fn store_artifact(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Json(payload): Json<StoreArtifactRequest>,
) -> Result<(StatusCode, Json<Confirmation>), ApiError> {
    let path = state
        .mailbox
        .store_artifact(&job_id, &payload.filename, &payload.content)?;
    Ok((
        StatusCode::CREATED,
        Json(Confirmation {
            message: format!("Artifact {} stored for job {}", payload.filename, job_id),
            path: path.display().to_string(),
        }),
    ))
}
