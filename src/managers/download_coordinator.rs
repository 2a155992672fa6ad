//! Download Coordinator for leech.
//!
//! Turns a request into a durable, deduplicated unit of background work:
//! resolve the record by id (inserting it on first sight), then enqueue a
//! job under that id with the keep-existing policy.

use std::sync::Arc;

use tracing::{debug, info};

use crate::managers::download_store::DownloadStoreTrait;
use crate::managers::job_queue::JobQueueTrait;
use crate::types::download::DownloadRecord;
use crate::types::errors::LeechError;
use crate::types::job::{
    ExistingJobPolicy, JobData, EXTRA_DOWNLOAD_ENTITY, EXTRA_NOTIFICATION_ICON,
    EXTRA_NOTIFICATION_IMPORTANCE,
};
use crate::types::settings::NotificationSettings;

pub struct DownloadCoordinator {
    store: Arc<dyn DownloadStoreTrait>,
    queue: Arc<dyn JobQueueTrait>,
    notification: NotificationSettings,
}

impl DownloadCoordinator {
    pub fn new(
        store: Arc<dyn DownloadStoreTrait>,
        queue: Arc<dyn JobQueueTrait>,
        notification: NotificationSettings,
    ) -> Self {
        Self {
            store,
            queue,
            notification,
        }
    }

    /// Resolves `record` against the store and schedules its job.
    ///
    /// When a record with the same id already exists, the stored record wins
    /// and the transient fields of `record` are discarded. Returns the
    /// effective record.
    ///
    /// # Errors
    /// Store and serialization errors propagate; nothing is enqueued then.
    pub async fn submit(&self, record: DownloadRecord) -> Result<DownloadRecord, LeechError> {
        let effective = self.store.insert_or_get(&record).await?;
        if effective != record {
            debug!(id = effective.id, status = %effective.status, "reusing stored record");
        }

        let data = self.job_data(&effective)?;
        if self
            .queue
            .enqueue_unique(effective.id, ExistingJobPolicy::Keep, data)
        {
            info!(id = effective.id, url = %effective.url, "download enqueued");
        } else {
            debug!(id = effective.id, "download already in flight");
        }

        Ok(effective)
    }

    fn job_data(&self, record: &DownloadRecord) -> Result<JobData, serde_json::Error> {
        Ok(JobData::new()
            .put_string(EXTRA_DOWNLOAD_ENTITY, record.to_json()?)
            .put_int(EXTRA_NOTIFICATION_ICON, self.notification.icon)
            .put_int(
                EXTRA_NOTIFICATION_IMPORTANCE,
                self.notification.importance.level(),
            ))
    }
}
