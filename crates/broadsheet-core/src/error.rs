//! Error types module
//!
//! All failures of the image pipeline are unified under [`AppError`]. The first
//! four image-specific variants (`Decode`, `InvalidFormat`, `NotFound`,
//! `Processing`) terminate a single item's attempt and are recorded on the row;
//! `Store` covers failures of the image store itself.
//!
//! The `Store` variant wraps `sqlx::Error` when the `sqlx` feature is enabled
//! and falls back to a plain message otherwise.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected failures such as a bad request
    Debug,
    /// Per-item failures that are recorded and retried
    Warn,
    /// Unexpected failures of the store or the process
    Error,
}

/// Describes how an error is presented to operators and HTTP clients.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether a later attempt may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the caller
    fn suggested_action(&self) -> Option<&'static str>;

    /// Caller-facing message (may hide internal details)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to get dimensions: {0}")]
    Decode(String),

    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    #[error("Original file not found: {0}")]
    NotFound(String),

    #[error("Dithering failed: {0}")]
    Processing(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Store(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Store(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image with ID {0} not found")]
    ImageNotFound(i64),

    #[error("Image {0} is already being processed")]
    AlreadyProcessing(i64),

    #[error("Image {0} is not eligible for automatic processing")]
    NotEligible(i64),

    #[error("Dithering timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Store(err)
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata per variant: (http_status, error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Decode(_) => (
            422,
            "DECODE_ERROR",
            false,
            Some("Re-upload the image; the stored file could not be decoded"),
            LogLevel::Warn,
        ),
        AppError::InvalidFormat => (
            422,
            "INVALID_FORMAT",
            false,
            Some("Use a JPEG, PNG, WEBP, GIF or TIFF image up to 10000x10000"),
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            404,
            "FILE_NOT_FOUND",
            false,
            Some("Check that the original file is present in storage"),
            LogLevel::Warn,
        ),
        AppError::Processing(_) => (
            500,
            "PROCESSING_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        AppError::Store(_) => (
            500,
            "STORE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::ImageNotFound(_) => (
            404,
            "IMAGE_NOT_FOUND",
            false,
            Some("Verify the image ID exists"),
            LogLevel::Debug,
        ),
        AppError::AlreadyProcessing(_) => (
            409,
            "ALREADY_PROCESSING",
            true,
            Some("Wait for the current attempt to finish"),
            LogLevel::Debug,
        ),
        AppError::NotEligible(_) => (
            409,
            "NOT_ELIGIBLE",
            false,
            Some("Process the image by ID or reset failed images"),
            LogLevel::Debug,
        ),
        AppError::Timeout { .. } => (
            504,
            "PROCESSING_TIMEOUT",
            true,
            Some("Retry later or reduce the source image size"),
            LogLevel::Warn,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Message chain including sources, for logs.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Store(_) => "Failed to access the image store".to_string(),
            AppError::Storage(_) => "Failed to access file storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_conflicts_map_to_409() {
        let err = AppError::NotEligible(3);
        assert_eq!(
            err.to_string(),
            "Image 3 is not eligible for automatic processing"
        );
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(AppError::AlreadyProcessing(3).http_status_code(), 409);
        assert_eq!(
            AppError::Timeout { millis: 250 }.to_string(),
            "Dithering timed out after 250ms"
        );
    }

    #[test]
    fn test_not_found_message_names_the_path() {
        let err = AppError::NotFound("uploads/missing.png".into());
        assert_eq!(
            err.to_string(),
            "Original file not found: uploads/missing.png"
        );
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = AppError::Internal("secret path /var/lib".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.log_level(), LogLevel::Error);

        let err = AppError::ImageNotFound(42);
        assert_eq!(err.client_message(), "Image with ID 42 not found");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err: AppError = anyhow::anyhow!("root cause")
            .context("while reading")
            .into();
        let details = err.detailed_message();
        assert!(details.contains("Internal error with source"));
        assert!(details.contains("root cause"));
    }
}
