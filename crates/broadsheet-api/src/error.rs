//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; any `AppError` converts with `?`
//! and renders as a JSON [`ErrorResponse`] with the status from its metadata.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use broadsheet_core::{AppError, ErrorMetadata, LogLevel};
use broadsheet_infra::ErrorResponse;
use serde::de::DeserializeOwned;

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that answers malformed bodies with our error format.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error.detailed_message(), code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = ErrorResponse::new(app_error.client_message())
            .with_type(app_error.error_code())
            .with_suggested_action(app_error.suggested_action());

        (status, Json(body)).into_response()
    }
}
