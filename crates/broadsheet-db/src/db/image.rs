//! Image repository: the `images` table and its processing lifecycle.

use broadsheet_core::models::{ImageRecord, NewImage, ProcessingStatus, StatusCounts};
use broadsheet_core::AppError;
use chrono::{Duration, Utc};
use sqlx::{Row, Sqlite, SqlitePool};

macro_rules! image_columns {
    () => {
        r#"
        id,
        filename,
        original_path,
        processed_path,
        width,
        height,
        is_processed,
        processing_status,
        processing_attempts,
        processing_started_at,
        processing_completed_at,
        processing_error,
        created_at,
        updated_at
        "#
    };
}

/// Error text written to rows reclaimed by [`ImageRepository::reap_stale_processing`].
pub const STALE_CLAIM_ERROR: &str = "Processing timed out (stale claim reclaimed)";

#[derive(Clone)]
pub struct ImageRepository {
    pool: SqlitePool,
}

impl ImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a freshly ingested image as `pending` with zero attempts.
    #[tracing::instrument(skip(self, image), fields(db.table = "images", filename = %image.filename))]
    pub async fn create(&self, image: &NewImage) -> Result<ImageRecord, AppError> {
        let now = Utc::now();
        let record = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            r#"
            INSERT INTO images (
                filename, original_path, width, height, is_processed,
                processing_status, processing_attempts, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, 0, 'pending', 0, ?, ?)
            RETURNING
            "#,
            image_columns!()
        ))
        .bind(&image.filename)
        .bind(&image.original_path)
        .bind(image.width)
        .bind(image.height)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(image_id = record.id, "Image row created");
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images", db.record_id = id))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ImageRecord>, AppError> {
        let record = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            "SELECT",
            image_columns!(),
            "FROM images WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Rows eligible for automatic processing: `pending` or `failed` with
    /// attempts left, never-tried work first, then oldest first.
    #[tracing::instrument(skip(self), fields(db.table = "images"))]
    pub async fn select_batch(
        &self,
        limit: i64,
        max_attempts: i32,
    ) -> Result<Vec<ImageRecord>, AppError> {
        let records = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            "SELECT",
            image_columns!(),
            r#"
            FROM images
            WHERE processing_status IN ('pending', 'failed')
                AND processing_attempts < ?
            ORDER BY
                CASE processing_status WHEN 'pending' THEN 0 ELSE 1 END ASC,
                created_at ASC,
                id ASC
            LIMIT ?
            "#
        ))
        .bind(max_attempts)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::trace!(count = records.len(), "Selected processing batch");
        Ok(records)
    }

    /// Claim a row selected for automatic processing. The conditional update
    /// re-checks eligibility (`pending`/`failed` with attempts left), so a
    /// stale batch record can never re-open a row that another caller has
    /// since completed, exhausted or claimed.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.record_id = id))]
    pub async fn claim(&self, id: i64, max_attempts: i32) -> Result<ImageRecord, AppError> {
        let now = Utc::now();
        let claimed = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            r#"
            UPDATE images
            SET processing_status = 'processing',
                processing_started_at = ?,
                processing_attempts = processing_attempts + 1,
                updated_at = ?
            WHERE id = ?
                AND processing_status IN ('pending', 'failed')
                AND processing_attempts < ?
            RETURNING
            "#,
            image_columns!()
        ))
        .bind(now)
        .bind(now)
        .bind(id)
        .bind(max_attempts)
        .fetch_optional(&self.pool)
        .await?;

        match claimed {
            Some(record) => Ok(Self::claimed(record)),
            None => Err(self.claim_conflict(id, Some(max_attempts)).await),
        }
    }

    /// Claim a row regardless of status or attempt count (process by id).
    /// Only a row already in `processing` is refused.
    #[tracing::instrument(skip(self), fields(db.table = "images", db.record_id = id))]
    pub async fn force_claim(&self, id: i64) -> Result<ImageRecord, AppError> {
        let now = Utc::now();
        let claimed = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            r#"
            UPDATE images
            SET processing_status = 'processing',
                processing_started_at = ?,
                processing_attempts = processing_attempts + 1,
                is_processed = 0,
                processed_path = NULL,
                updated_at = ?
            WHERE id = ? AND processing_status <> 'processing'
            RETURNING
            "#,
            image_columns!()
        ))
        .bind(now)
        .bind(now)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match claimed {
            Some(record) => Ok(Self::claimed(record)),
            None => Err(self.claim_conflict(id, None).await),
        }
    }

    fn claimed(record: ImageRecord) -> ImageRecord {
        tracing::debug!(
            image_id = record.id,
            attempts = record.processing_attempts,
            "Image claimed"
        );
        record
    }

    /// Explain why a claim matched no row.
    async fn claim_conflict(&self, id: i64, max_attempts: Option<i32>) -> AppError {
        let current = match self.get_by_id(id).await {
            Ok(current) => current,
            Err(e) => return e,
        };

        match (current, max_attempts) {
            (None, _) => AppError::ImageNotFound(id),
            (Some(row), _) if row.processing_status == ProcessingStatus::Processing => {
                AppError::AlreadyProcessing(id)
            }
            (Some(row), Some(max)) if !row.is_eligible(max) => AppError::NotEligible(id),
            // The row changed between the update and this read.
            (Some(_), _) => AppError::AlreadyProcessing(id),
        }
    }

    /// Record a successful attempt. The write is fenced on the claim
    /// (`processing` with the same attempt number); `None` means the claim was
    /// lost, e.g. reclaimed by the stale reaper, and nothing was written.
    #[tracing::instrument(skip(self, processed_path), fields(db.table = "images", db.record_id = id))]
    pub async fn mark_completed(
        &self,
        id: i64,
        attempt: i32,
        processed_path: &str,
        width: u32,
        height: u32,
    ) -> Result<Option<ImageRecord>, AppError> {
        let now = Utc::now();
        let record = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            r#"
            UPDATE images
            SET processing_status = 'completed',
                processing_completed_at = ?,
                processing_error = NULL,
                is_processed = 1,
                processed_path = ?,
                width = ?,
                height = ?,
                updated_at = ?
            WHERE id = ?
                AND processing_status = 'processing'
                AND processing_attempts = ?
            RETURNING
            "#,
            image_columns!()
        ))
        .bind(now)
        .bind(processed_path)
        .bind(width)
        .bind(height)
        .bind(now)
        .bind(id)
        .bind(attempt)
        .fetch_optional(&self.pool)
        .await?;

        if record.is_some() {
            tracing::info!(image_id = id, processed_path, "Image processing completed");
        }
        Ok(record)
    }

    /// Record a failed attempt, fenced like [`mark_completed`](Self::mark_completed).
    #[tracing::instrument(skip(self, error), fields(db.table = "images", db.record_id = id))]
    pub async fn mark_failed(
        &self,
        id: i64,
        attempt: i32,
        error: &str,
    ) -> Result<Option<ImageRecord>, AppError> {
        let record = sqlx::query_as::<Sqlite, ImageRecord>(concat!(
            r#"
            UPDATE images
            SET processing_status = 'failed',
                processing_error = ?,
                is_processed = 0,
                processed_path = NULL,
                updated_at = ?
            WHERE id = ?
                AND processing_status = 'processing'
                AND processing_attempts = ?
            RETURNING
            "#,
            image_columns!()
        ))
        .bind(error)
        .bind(Utc::now())
        .bind(id)
        .bind(attempt)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref row) = record {
            tracing::warn!(
                image_id = id,
                attempts = row.processing_attempts,
                error,
                "Image processing failed"
            );
        }
        Ok(record)
    }

    /// Put every `failed` row back to `pending` with a clean attempt counter.
    #[tracing::instrument(skip(self), fields(db.table = "images"))]
    pub async fn reset_failed(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE images
            SET processing_status = 'pending',
                processing_error = NULL,
                processing_attempts = 0,
                updated_at = ?
            WHERE processing_status = 'failed'
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        tracing::info!(count, "Failed images reset to pending");
        Ok(count)
    }

    /// Move `processing` rows whose claim is older than `grace_period_secs` to
    /// `failed`, so they become eligible again while attempts remain.
    #[tracing::instrument(skip(self), fields(db.table = "images"))]
    pub async fn reap_stale_processing(&self, grace_period_secs: i64) -> Result<u64, AppError> {
        let now = Utc::now();
        let cutoff = now - Duration::seconds(grace_period_secs);
        let result = sqlx::query(
            r#"
            UPDATE images
            SET processing_status = 'failed',
                processing_error = ?,
                updated_at = ?
            WHERE processing_status = 'processing'
                AND (processing_started_at IS NULL OR processing_started_at < ?)
            "#,
        )
        .bind(STALE_CLAIM_ERROR)
        .bind(now)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let count = result.rows_affected();
        if count > 0 {
            tracing::warn!(count, grace_period_secs, "Reclaimed stale processing rows");
        }
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "images"))]
    pub async fn status_counts(&self) -> Result<StatusCounts, AppError> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN processing_status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN processing_status = 'processing' THEN 1 ELSE 0 END), 0) AS processing,
                COALESCE(SUM(CASE WHEN processing_status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN processing_status = 'failed' THEN 1 ELSE 0 END), 0) AS failed
            FROM images
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StatusCounts {
            pending: row.try_get("pending")?,
            processing: row.try_get("processing")?,
            completed: row.try_get("completed")?,
            failed: row.try_get("failed")?,
        })
    }
}
