//! Shared plumbing for the `process-images` operator CLI.

use anyhow::Context;
use broadsheet_core::models::QueueStatus;
use broadsheet_core::Config;
use broadsheet_db::ImageRepository;
use broadsheet_storage::LocalStorage;
use broadsheet_worker::{ImageWorker, ProcessingQueue};
use std::sync::Arc;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("broadsheet=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Wire a worker against the configured database and storage root.
pub async fn build_worker(config: &Config) -> anyhow::Result<Arc<ImageWorker>> {
    let pool = broadsheet_db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    let storage = LocalStorage::new(&config.storage_path)
        .await
        .context("Failed to open storage")?;

    let queue = ProcessingQueue::new(ImageRepository::new(pool), &config.processing);
    Ok(Arc::new(ImageWorker::new(
        queue,
        Arc::new(storage),
        config.processing.clone(),
    )))
}

/// Human-readable queue status.
pub fn format_status(status: &QueueStatus) -> String {
    format!(
        "Processing Queue Status:\n\
         - Pending: {}\n\
         - Processing: {}\n\
         - Completed: {}\n\
         - Failed: {}\n\
         - Worker Running: {}\n\
         - Current Jobs: {}",
        status.pending,
        status.processing,
        status.completed,
        status.failed,
        status.is_running,
        status.current_jobs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadsheet_core::models::StatusCounts;

    #[test]
    fn format_status_lists_every_count() {
        let status = QueueStatus::new(
            StatusCounts {
                pending: 4,
                processing: 1,
                completed: 10,
                failed: 2,
            },
            1,
            false,
        );
        let text = format_status(&status);
        assert!(text.starts_with("Processing Queue Status:"));
        assert!(text.contains("- Pending: 4"));
        assert!(text.contains("- Processing: 1"));
        assert!(text.contains("- Completed: 10"));
        assert!(text.contains("- Failed: 2"));
        assert!(text.contains("- Worker Running: false"));
        assert!(text.contains("- Current Jobs: 1"));
    }
}
