use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub worker_running: bool,
}

/// Database must answer; storage problems only degrade the report.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = HealthCheckResponse {
        status: "healthy".to_string(),
        database: "unknown".to_string(),
        storage: "unknown".to_string(),
        worker_running: state.worker.is_running(),
    };
    let mut overall_healthy = true;

    match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(&state.db_pool))
        .await
    {
        Ok(Ok(_)) => response.database = "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response.database = format!("unhealthy: {}", e);
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response.database = "timeout".to_string();
            overall_healthy = false;
        }
    }

    match tokio::time::timeout(CHECK_TIMEOUT, state.storage.exists("health-check")).await {
        Ok(Ok(_)) => response.storage = "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Storage health check warning");
            response.storage = format!("degraded: {}", e);
        }
        Err(_) => {
            tracing::warn!("Storage health check timed out");
            response.storage = "timeout".to_string();
        }
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        response.status = "unhealthy".to_string();
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
