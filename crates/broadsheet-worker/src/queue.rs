//! Processing queue: batch selection, claims and terminal transitions on top of
//! the image repository.
//!
//! Terminal writes (`complete`, `fail`) are best effort: a store failure is
//! logged and swallowed so one bad write never takes down the worker. A row
//! left in `processing` that way is picked up by the stale-claim reaper. Both
//! writes only land while the attempt's claim is still held.

use broadsheet_core::models::{ImageRecord, StatusCounts};
use broadsheet_core::{AppError, ProcessingConfig};
use broadsheet_db::ImageRepository;

#[derive(Clone)]
pub struct ProcessingQueue {
    repository: ImageRepository,
    max_retries: i32,
    batch_size: i64,
}

impl ProcessingQueue {
    pub fn new(repository: ImageRepository, config: &ProcessingConfig) -> Self {
        Self {
            repository,
            max_retries: config.max_retries,
            batch_size: config.batch_size,
        }
    }

    /// Next batch of eligible rows, at most `batch_size` long.
    pub async fn select_batch(&self) -> Result<Vec<ImageRecord>, AppError> {
        self.repository
            .select_batch(self.batch_size, self.max_retries)
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<ImageRecord>, AppError> {
        self.repository.get_by_id(id).await
    }

    /// Claim a row picked by [`select_batch`](Self::select_batch); fails with
    /// `NotEligible` if it has since been completed or exhausted elsewhere.
    pub async fn claim(&self, id: i64) -> Result<ImageRecord, AppError> {
        self.repository.claim(id, self.max_retries).await
    }

    /// Claim a row regardless of eligibility.
    pub async fn force_claim(&self, id: i64) -> Result<ImageRecord, AppError> {
        self.repository.force_claim(id).await
    }

    /// Record success for the claim identified by `attempt`.
    pub async fn complete(
        &self,
        id: i64,
        attempt: i32,
        processed_path: &str,
        width: u32,
        height: u32,
    ) {
        match self
            .repository
            .mark_completed(id, attempt, processed_path, width, height)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => Self::log_lost_claim(id, attempt, "completion"),
            Err(e) => tracing::error!(
                image_id = id,
                error = %e.detailed_message(),
                "Failed to record image completion"
            ),
        }
    }

    pub async fn fail(&self, id: i64, attempt: i32, error_message: &str) {
        match self
            .repository
            .mark_failed(id, attempt, error_message)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => Self::log_lost_claim(id, attempt, "failure"),
            Err(e) => tracing::error!(
                image_id = id,
                error = %e.detailed_message(),
                "Failed to record image failure"
            ),
        }
    }

    fn log_lost_claim(id: i64, attempt: i32, outcome: &str) {
        tracing::warn!(
            image_id = id,
            attempt,
            outcome,
            "Claim no longer held, skipping status write"
        );
    }

    pub async fn reset_failed(&self) -> Result<u64, AppError> {
        self.repository.reset_failed().await
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, AppError> {
        self.repository.status_counts().await
    }

    pub async fn reap_stale(&self, grace_period_secs: i64) -> Result<u64, AppError> {
        self.repository
            .reap_stale_processing(grace_period_secs)
            .await
    }
}
