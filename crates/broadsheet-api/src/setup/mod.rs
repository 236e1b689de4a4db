//! Application setup: database, storage, worker and routes

pub mod routes;
pub mod server;

pub use routes::build_router;

use crate::state::AppState;
use anyhow::Context;
use axum::Router;
use broadsheet_core::Config;
use broadsheet_db::ImageRepository;
use broadsheet_storage::LocalStorage;
use broadsheet_worker::{ImageWorker, ProcessingQueue};
use std::sync::Arc;

/// Connect to the store, open storage and build the router. The worker loop
/// is not started; use the `start_worker` action or the CLI `worker` command.
pub async fn initialize_app(config: Config) -> anyhow::Result<(Arc<AppState>, Router)> {
    let pool = broadsheet_db::connect(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to connect to database")?;

    let storage = Arc::new(
        LocalStorage::new(&config.storage_path)
            .await
            .context("Failed to open storage")?,
    );

    let repository = ImageRepository::new(pool.clone());
    let queue = ProcessingQueue::new(repository, &config.processing);
    let worker = Arc::new(ImageWorker::new(
        queue,
        storage.clone(),
        config.processing.clone(),
    ));

    let state = Arc::new(AppState {
        db_pool: pool,
        storage,
        worker,
    });

    let router = build_router(state.clone());
    Ok((state, router))
}
