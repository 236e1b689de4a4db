pub mod fixtures;

use broadsheet_core::models::{ImageRecord, NewImage};
use broadsheet_core::ProcessingConfig;
use broadsheet_db::ImageRepository;
use broadsheet_storage::{LocalStorage, Storage};
use broadsheet_worker::{ImageWorker, ProcessingQueue};
use std::sync::Arc;
use tempfile::TempDir;

/// Worker wired to an isolated SQLite database and storage directory
pub struct TestWorker {
    pub worker: Arc<ImageWorker>,
    pub repository: ImageRepository,
    pub storage: Arc<LocalStorage>,
    pub _temp_dir: TempDir,
}

impl TestWorker {
    /// Insert a pending row; when `bytes` is given the source file is written
    /// to `uploads/{filename}` first.
    pub async fn insert_image(&self, filename: &str, bytes: Option<&[u8]>) -> ImageRecord {
        let original_path = format!("uploads/{}", filename);
        if let Some(bytes) = bytes {
            self.storage.write(&original_path, bytes).await.unwrap();
        }
        self.repository
            .create(&NewImage::new(filename, original_path))
            .await
            .unwrap()
    }

    pub async fn reload(&self, id: i64) -> ImageRecord {
        self.repository.get_by_id(id).await.unwrap().unwrap()
    }
}

/// Config suited to tests: short delays, no background reaper
pub fn test_config() -> ProcessingConfig {
    ProcessingConfig {
        poll_interval_ms: 50,
        retry_delay_ms: 50,
        drain_delay_ms: 10,
        stale_reap_interval_secs: 0,
        ..ProcessingConfig::default()
    }
}

pub async fn setup_worker(config: ProcessingConfig) -> TestWorker {
    let temp_dir = tempfile::tempdir().unwrap();
    let database_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    let pool = broadsheet_db::connect(&database_url, 4).await.unwrap();
    let repository = ImageRepository::new(pool);

    let storage = Arc::new(
        LocalStorage::new(temp_dir.path().join("storage"))
            .await
            .unwrap(),
    );

    let queue = ProcessingQueue::new(repository.clone(), &config);
    let worker = Arc::new(ImageWorker::new(queue, storage.clone(), config));

    TestWorker {
        worker,
        repository,
        storage,
        _temp_dir: temp_dir,
    }
}
