use broadsheet_storage::Storage;
use broadsheet_worker::ImageWorker;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub storage: Arc<dyn Storage>,
    pub worker: Arc<ImageWorker>,
}

impl AppState {
    /// Start the processing loop in the background. Returns `false` if it is
    /// already running.
    pub fn start_worker(&self) -> bool {
        if self.worker.is_running() {
            return false;
        }
        let worker = self.worker.clone();
        tokio::spawn(async move { worker.run().await });
        true
    }
}
