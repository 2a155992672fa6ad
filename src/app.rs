//! Public facade for leech.
//!
//! [`Leech`] wires the store, job queue, worker and coordinator together and
//! is the only type callers need. Construct it once per process and share it
//! (it is `Send + Sync`; wrap it in an `Arc` to hand it around).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::database::connection::Database;
use crate::managers::download_coordinator::DownloadCoordinator;
use crate::managers::download_store::{
    DownloadStore, DownloadStoreTrait, RecordListStream, RecordStream,
};
use crate::managers::job_queue::{JobQueue, JobQueueTrait};
use crate::services::download_worker::DownloadWorker;
use crate::services::notifier::{DownloadNotifier, LoggingNotifier};
use crate::services::transfer_executor::TransferExecutor;
use crate::services::transport::{HttpTransport, Transport};
use crate::types::download::{DownloadRecord, DownloadRequest};
use crate::types::errors::{LeechError, StoreError};
use crate::types::settings::LeechSettings;

pub struct Leech {
    store: Arc<DownloadStore>,
    queue: Arc<JobQueue>,
    coordinator: DownloadCoordinator,
    notifier: Arc<dyn DownloadNotifier>,
}

impl Leech {
    /// Opens the database at `settings.database_path` and uses the HTTP
    /// transport and the logging notifier.
    pub fn new(settings: &LeechSettings) -> Result<Self, LeechError> {
        let db = Database::open(&settings.database_path).map_err(StoreError::from)?;
        let transport = HttpTransport::new(&settings.transfer)?;
        Ok(Self::with_parts(
            settings,
            Arc::new(db),
            Arc::new(transport),
            Arc::new(LoggingNotifier),
        ))
    }

    /// Builds an instance from explicit collaborators.
    pub fn with_parts(
        settings: &LeechSettings,
        db: Arc<Database>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn DownloadNotifier>,
    ) -> Self {
        let store = Arc::new(DownloadStore::new(db));
        let executor = TransferExecutor::new(transport, &settings.transfer);
        let worker = DownloadWorker::new(store.clone(), executor, notifier.clone());
        let queue = Arc::new(JobQueue::new(
            Arc::new(worker),
            settings.queue.max_concurrent_jobs,
        ));
        let coordinator = DownloadCoordinator::new(
            store.clone(),
            queue.clone(),
            settings.notification.clone(),
        );

        Self {
            store,
            queue,
            coordinator,
            notifier,
        }
    }

    /// Schedules a download. Returns once the record is persisted and the
    /// job is enqueued, well before the transfer finishes.
    pub async fn submit(&self, request: DownloadRequest) -> Result<DownloadRecord, LeechError> {
        let record = request.into_record()?;
        self.coordinator.submit(record).await
    }

    /// Convenience form of [`submit`](Self::submit); returns the download id.
    pub async fn download(
        &self,
        url: &str,
        path: &str,
        file_name: Option<&str>,
        headers: HashMap<String, String>,
    ) -> Result<i32, LeechError> {
        let mut request = DownloadRequest::new(url, path).headers(headers);
        if let Some(name) = file_name {
            request = request.file_name(name);
        }
        Ok(self.submit(request).await?.id)
    }

    /// Live listing of every download, ordered by enqueue time.
    pub fn observe_all(&self) -> RecordListStream {
        self.store.observe_all()
    }

    /// Live view of one download; yields `None` while it does not exist.
    pub fn observe_one(&self, id: i32) -> RecordStream {
        self.store.observe(id)
    }

    /// Waits for the job currently scheduled for `id` to finish and returns
    /// the record as it was left.
    ///
    /// A resubmitted record still carries its previous terminal status until
    /// the new job writes to it, so the stored status alone does not tell
    /// whether the latest attempt has finished.
    pub async fn wait_for_outcome(&self, id: i32) -> Result<Option<DownloadRecord>, LeechError> {
        self.queue.wait_for(id).await;
        Ok(self.store.get(id).await?)
    }

    /// Cancels every job, then clears all records.
    pub async fn cancel_all(&self) -> Result<(), LeechError> {
        self.queue.cancel_all();
        self.store.delete_all().await?;
        info!("all downloads cancelled");
        Ok(())
    }

    /// Cancels the job for `id`, then deletes its record.
    pub async fn cancel_one(&self, id: i32) -> Result<(), LeechError> {
        self.queue.cancel_unique(id);
        self.store.delete(id).await?;
        self.notifier.on_cancel_requested(id);
        info!(id, "download cancelled");
        Ok(())
    }

    /// The underlying job queue, for inspecting job state.
    pub fn job_queue(&self) -> &JobQueue {
        &self.queue
    }
}
