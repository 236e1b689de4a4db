//! Image worker: single-item and batch processing plus the continuous loop.
//!
//! Stop is cooperative: [`ImageWorker::stop`] clears the running flag and wakes
//! the loop from its idle wait; it never cancels items already dispatched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use broadsheet_core::models::{ImageRecord, QueueStatus};
use broadsheet_core::{AppError, ProcessingConfig};
use broadsheet_processing::DitherProcessor;
use broadsheet_storage::{processed_key, Storage};
use tokio::sync::{mpsc, Notify};
use tokio::time::sleep;

use crate::in_flight::InFlightSet;
use crate::queue::ProcessingQueue;
use crate::settle::{settle_all, SettleReport};

/// Result of a successful attempt, as recorded on the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub processed_path: String,
    pub width: u32,
    pub height: u32,
}

pub struct ImageWorker {
    queue: ProcessingQueue,
    storage: Arc<dyn Storage>,
    config: ProcessingConfig,
    running: AtomicBool,
    current_jobs: InFlightSet,
    wake: Notify,
}

impl ImageWorker {
    pub fn new(queue: ProcessingQueue, storage: Arc<dyn Storage>, config: ProcessingConfig) -> Self {
        Self {
            queue,
            storage,
            config,
            running: AtomicBool::new(false),
            current_jobs: InFlightSet::new(),
            wake: Notify::new(),
        }
    }

    pub fn queue(&self) -> &ProcessingQueue {
        &self.queue
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ids currently being processed by this worker.
    pub fn current_jobs(&self) -> &InFlightSet {
        &self.current_jobs
    }

    /// Claim `record` as a batch item, dither its source and record the
    /// outcome.
    ///
    /// Item errors are written to the row with `fail` and then returned. A
    /// claim that cannot be taken (row gone, already processing, no longer
    /// eligible, store down) is returned without touching the row.
    #[tracing::instrument(skip(self, record), fields(image_id = record.id))]
    pub async fn process_one(&self, record: ImageRecord) -> Result<ProcessedImage, AppError> {
        let claimed = self.queue.claim(record.id).await?;
        self.process_claimed(claimed).await
    }

    async fn process_claimed(&self, claimed: ImageRecord) -> Result<ProcessedImage, AppError> {
        let id = claimed.id;
        let attempt = claimed.processing_attempts;

        tracing::info!(
            filename = %claimed.filename,
            attempt,
            "Processing image"
        );

        match self.dither_record(&claimed).await {
            Ok(processed) => {
                self.queue
                    .complete(
                        id,
                        attempt,
                        &processed.processed_path,
                        processed.width,
                        processed.height,
                    )
                    .await;
                tracing::info!(
                    processed_path = %processed.processed_path,
                    width = processed.width,
                    height = processed.height,
                    "Successfully processed image"
                );
                Ok(processed)
            }
            Err(err) => {
                tracing::error!(error = %err, "Error processing image");
                self.queue.fail(id, attempt, &err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn dither_record(&self, record: &ImageRecord) -> Result<ProcessedImage, AppError> {
        if !self.storage.exists(&record.original_path).await? {
            return Err(AppError::NotFound(record.original_path.clone()));
        }
        let data = self.storage.read(&record.original_path).await?;

        if !DitherProcessor::validate(&data) {
            return Err(AppError::InvalidFormat);
        }

        let (source_width, source_height) = match record.stored_dimensions() {
            Some(dims) => dims,
            None => DitherProcessor::dimensions(&data)?,
        };
        let (width, height) = DitherProcessor::output_dimensions(
            source_width,
            source_height,
            self.config.max_width,
            self.config.max_height,
        );

        let output = self.run_dither(data).await?;

        let key = processed_key(&self.config.processed_prefix, record.id);
        self.storage.write(&key, &output).await?;

        Ok(ProcessedImage {
            processed_path: key,
            width,
            height,
        })
    }

    /// Dither on the blocking pool, bounded by the configured timeout. On
    /// timeout the blocking thread finishes in the background and its output
    /// is dropped.
    async fn run_dither(&self, data: Vec<u8>) -> Result<Vec<u8>, AppError> {
        let (max_width, max_height) = (self.config.max_width, self.config.max_height);
        let task =
            tokio::task::spawn_blocking(move || DitherProcessor::dither(&data, max_width, max_height));

        let joined = match self.config.dither_timeout() {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| AppError::Timeout {
                    millis: self.config.dither_timeout_ms,
                })?,
            None => task.await,
        };

        joined.map_err(|e| AppError::Processing(format!("dithering task aborted: {}", e)))?
    }

    /// Process the next batch of eligible rows concurrently.
    ///
    /// Returns how many rows were attempted. Per-item failures are already on
    /// their rows and are only logged here; an error means the batch itself
    /// could not be selected.
    pub async fn process_batch(&self) -> Result<usize, AppError> {
        let batch = self.queue.select_batch().await?;
        if batch.is_empty() {
            tracing::trace!("No images eligible for processing");
            return Ok(0);
        }

        tracing::info!(count = batch.len(), "Processing batch of images");

        let mut tasks = Vec::with_capacity(batch.len());
        for record in batch {
            let Some(guard) = self.current_jobs.try_track(record.id) else {
                tracing::debug!(image_id = record.id, "Image already in flight, skipping");
                continue;
            };
            tasks.push(async move {
                let _guard = guard;
                self.process_one(record).await
            });
        }

        let results = settle_all(tasks).await;
        let report = SettleReport::from_results(&results);
        let attempted = report.attempted();

        tracing::info!(
            attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "Batch finished"
        );
        Ok(attempted)
    }

    /// Process one row by id regardless of status or attempt count.
    #[tracing::instrument(skip(self))]
    pub async fn process_by_id(&self, id: i64) -> Result<ProcessedImage, AppError> {
        let record = self
            .queue
            .get(id)
            .await?
            .ok_or(AppError::ImageNotFound(id))?;

        let _guard = self
            .current_jobs
            .try_track(id)
            .ok_or(AppError::AlreadyProcessing(id))?;
        let claimed = self.queue.force_claim(record.id).await?;
        self.process_claimed(claimed).await
    }

    pub async fn reset_failed(&self) -> Result<u64, AppError> {
        self.queue.reset_failed().await
    }

    pub async fn status(&self) -> Result<QueueStatus, AppError> {
        let counts = self.queue.status_counts().await?;
        Ok(QueueStatus::new(
            counts,
            self.current_jobs.len(),
            self.is_running(),
        ))
    }

    /// Poll and process until [`stop`](Self::stop) is called.
    ///
    /// Waits `poll_interval` after an empty batch, `drain_delay` after a
    /// non-empty one and `retry_delay` after a loop-level error. Returns
    /// immediately if the loop is already running.
    pub async fn run(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Image worker is already running");
            return;
        }

        tracing::info!(
            batch_size = self.config.batch_size,
            max_retries = self.config.max_retries,
            poll_interval_ms = self.config.poll_interval_ms,
            "Image worker started"
        );

        let reaper_shutdown_tx = self.spawn_stale_reaper();

        while self.is_running() {
            let delay = match self.process_batch().await {
                Ok(0) => self.config.poll_interval(),
                Ok(_) => self.config.drain_delay(),
                Err(e) => {
                    tracing::error!(error = %e.detailed_message(), "Image worker loop error");
                    self.config.retry_delay()
                }
            };

            self.idle(delay).await;
        }

        if let Some(tx) = reaper_shutdown_tx {
            let _ = tx.send(()).await;
        }
        tracing::info!("Image worker stopped");
    }

    /// Clear the running flag. In-flight items run to completion.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("Stopping image worker");
            // Wakes only a loop parked in `idle`; no permit outlives this call.
            self.wake.notify_waiters();
        }
    }

    /// Sleep for `delay` unless stopped. The waiter is registered before the
    /// flag is checked, so a `stop` in between still ends the wait.
    async fn idle(&self, delay: Duration) {
        let notified = self.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.is_running() {
            return;
        }

        tokio::select! {
            _ = sleep(delay) => {}
            _ = notified => {}
        }
    }

    fn spawn_stale_reaper(&self) -> Option<mpsc::Sender<()>> {
        if self.config.stale_reap_interval_secs == 0 {
            return None;
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let queue = self.queue.clone();
        let reap_interval = Duration::from_secs(self.config.stale_reap_interval_secs);
        let grace_period = self.config.stale_processing_grace_secs;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(reap_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = queue.reap_stale(grace_period).await {
                            tracing::error!(error = %e, "Stale processing reaper failed");
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        Some(shutdown_tx)
    }
}
