//! Processing status and operator actions

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::Json};
use broadsheet_core::models::QueueStatus;
use broadsheet_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingActionRequest {
    pub action: String,
    #[serde(default)]
    pub image_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingActionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_path: Option<String>,
}

impl ProcessingActionResponse {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reset_count: None,
            processed_path: None,
        }
    }
}

/// Current queue counts plus in-flight jobs and worker state
#[tracing::instrument(skip(state))]
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<QueueStatus>, HttpAppError> {
    let status = state.worker.status().await?;
    Ok(Json(status))
}

/// Run an operator action against the queue
#[tracing::instrument(skip(state, request), fields(action = %request.action))]
pub async fn post_action(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ProcessingActionRequest>,
) -> Result<Json<ProcessingActionResponse>, HttpAppError> {
    let response = match request.action.as_str() {
        "reset_failed" => {
            let count = state.worker.reset_failed().await?;
            ProcessingActionResponse {
                reset_count: Some(count),
                ..ProcessingActionResponse::message(format!(
                    "Reset {} failed images to pending status",
                    count
                ))
            }
        }
        "process_image" => {
            let id = request
                .image_id
                .ok_or_else(|| AppError::InvalidInput("Image ID required".to_string()))?;
            let processed = state.worker.process_by_id(id).await?;
            ProcessingActionResponse {
                processed_path: Some(processed.processed_path),
                ..ProcessingActionResponse::message(format!("Processed image {}", id))
            }
        }
        "start_worker" => {
            if state.start_worker() {
                tracing::info!("Worker started via API");
                ProcessingActionResponse::message("Worker started")
            } else {
                ProcessingActionResponse::message("Worker already running")
            }
        }
        "stop_worker" => {
            state.worker.stop();
            ProcessingActionResponse::message("Worker stopped")
        }
        other => {
            return Err(AppError::InvalidInput(format!("Invalid action: {}", other)).into());
        }
    };

    Ok(Json(response))
}
