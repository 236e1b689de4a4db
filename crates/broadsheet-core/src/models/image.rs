use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Lifecycle state of an image in the processing queue.
///
/// ```text
/// pending --claim--> processing --complete--> completed
///                              \--fail------> failed --claim--> processing
/// failed --reset--> pending
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }

    /// Statuses the queue will pick up automatically (subject to the attempt ceiling).
    pub fn is_queueable(&self) -> bool {
        matches!(self, ProcessingStatus::Pending | ProcessingStatus::Failed)
    }
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A row of the `images` table as seen by the processing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ImageRecord {
    pub id: i64,
    pub filename: String,
    pub original_path: String,
    pub processed_path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub is_processed: bool,
    pub processing_status: ProcessingStatus,
    pub processing_attempts: i32,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub processing_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRecord {
    /// Whether automatic queue selection may pick this row up.
    pub fn is_eligible(&self, max_attempts: i32) -> bool {
        self.processing_status.is_queueable() && self.processing_attempts < max_attempts
    }

    /// Stored dimensions, if both are known and non-zero.
    pub fn stored_dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Insert payload used by the ingestion path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    pub filename: String,
    pub original_path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl NewImage {
    pub fn new(filename: impl Into<String>, original_path: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            original_path: original_path.into(),
            width: None,
            height: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Row counts per processing status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Snapshot returned by the "status" operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub current_jobs: usize,
    pub is_running: bool,
}

impl QueueStatus {
    pub fn new(counts: StatusCounts, current_jobs: usize, is_running: bool) -> Self {
        Self {
            pending: counts.pending,
            processing: counts.processing,
            completed: counts.completed,
            failed: counts.failed,
            current_jobs,
            is_running,
        }
    }
}
