//! Download Worker for leech.
//!
//! The job handler the queue runs for every download. It decodes the job
//! payload, re-reads the record, and either short-circuits (record gone or
//! already complete) or drives a transfer, persisting each step:
//!
//! `QUEUED -> LOADING -> COMPLETE` on success, `-> FAILED` on error.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::managers::download_store::DownloadStoreTrait;
use crate::managers::job_queue::{JobContext, JobHandler};
use crate::services::notifier::DownloadNotifier;
use crate::services::transfer_executor::TransferExecutor;
use crate::types::download::{DownloadRecord, DownloadStatus};
use crate::types::errors::{PayloadError, StoreError, TransferError};
use crate::types::job::{
    ForegroundInfo, JobData, JobOutcome, EXTRA_DOWNLOAD_ENTITY, EXTRA_NOTIFICATION_ICON,
    EXTRA_NOTIFICATION_IMPORTANCE,
};
use crate::types::notification::{NotificationImportance, NotificationTarget};
use crate::types::transfer::TransferEvent;

/// A decoded job payload.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub record: DownloadRecord,
    pub target: NotificationTarget,
}

impl DownloadJob {
    /// Decodes the record and notification hints from a job payload.
    pub fn decode(data: &JobData) -> Result<Self, PayloadError> {
        let json = data
            .get_string(EXTRA_DOWNLOAD_ENTITY)
            .ok_or(PayloadError::MissingEntity)?;
        let record = DownloadRecord::from_json(json)?;
        let target = NotificationTarget {
            id: record.id,
            file_name: record.file_name.clone(),
            icon: data.get_int(EXTRA_NOTIFICATION_ICON, -1),
            importance: NotificationImportance::from_level(
                data.get_int(EXTRA_NOTIFICATION_IMPORTANCE, -1),
            ),
        };
        Ok(Self { record, target })
    }
}

fn foreground(target: &NotificationTarget, progress: u8) -> ForegroundInfo {
    ForegroundInfo {
        notification_id: target.id,
        title: format!("Downloading {}", target.file_name),
        progress,
    }
}

pub struct DownloadWorker {
    store: Arc<dyn DownloadStoreTrait>,
    executor: TransferExecutor,
    notifier: Arc<dyn DownloadNotifier>,
}

impl DownloadWorker {
    pub fn new(
        store: Arc<dyn DownloadStoreTrait>,
        executor: TransferExecutor,
        notifier: Arc<dyn DownloadNotifier>,
    ) -> Self {
        Self {
            store,
            executor,
            notifier,
        }
    }

    async fn execute(&self, ctx: &JobContext, job: &DownloadJob) -> Result<JobOutcome, StoreError> {
        let current = match self.store.get(job.record.id).await? {
            Some(record) => record,
            None => {
                debug!(id = job.record.id, "record no longer exists, skipping");
                return Ok(JobOutcome::Success);
            }
        };

        if current.status == DownloadStatus::Complete {
            info!(id = current.id, "already complete, reporting success");
            self.notifier.on_success(&job.target, current.byte_size);
            return Ok(JobOutcome::Success);
        }

        ctx.set_foreground(foreground(&job.target, 0));

        let headers = match current.headers() {
            Ok(headers) => headers,
            Err(e) => {
                let error = TransferError::Headers(e.to_string());
                return self.fail(&current, &job.target, error).await;
            }
        };

        let mut latest = current.clone();
        let mut events = self
            .executor
            .fetch(current.destination(), current.url.clone(), headers);

        while let Some(event) = events.next().await {
            match event {
                TransferEvent::Downloading { progress, bytes } => {
                    latest = current.with_progress(bytes, DownloadStatus::Loading);
                    if !self.store.update(&latest).await? {
                        debug!(id = current.id, "record removed mid-transfer, stopping");
                        return Ok(JobOutcome::Success);
                    }
                    self.notifier.on_progress(&job.target, progress);
                    ctx.set_foreground(foreground(&job.target, progress));
                }
                TransferEvent::Success { total_bytes } => {
                    let completed = current.with_progress(total_bytes, DownloadStatus::Complete);
                    if self.store.update(&completed).await? {
                        self.notifier.on_success(&job.target, total_bytes);
                    }
                    return Ok(JobOutcome::Success);
                }
                TransferEvent::Error(error) => {
                    return self.fail(&latest, &job.target, error).await;
                }
            }
        }

        Ok(JobOutcome::Success)
    }

    async fn fail(
        &self,
        record: &DownloadRecord,
        target: &NotificationTarget,
        error: TransferError,
    ) -> Result<JobOutcome, StoreError> {
        warn!(id = record.id, error = %error, "download failed");
        let failed = record.with_progress(record.byte_size, DownloadStatus::Failed);
        if !self.store.update(&failed).await? {
            debug!(id = record.id, "record removed before failure was recorded");
            return Ok(JobOutcome::Success);
        }
        self.notifier.on_failure(target);
        Ok(JobOutcome::Failure)
    }
}

#[async_trait]
impl JobHandler for DownloadWorker {
    async fn run(&self, ctx: &JobContext) -> JobOutcome {
        let job = match DownloadJob::decode(ctx.data()) {
            Ok(job) => job,
            Err(e) => {
                error!(key = ctx.key(), error = %e, "rejecting job payload");
                return JobOutcome::Failure;
            }
        };

        match self.execute(ctx, &job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(id = job.record.id, error = %e, "download store error");
                let failed = job.record.with_progress(job.record.byte_size, DownloadStatus::Failed);
                if let Ok(true) = self.store.update(&failed).await {
                    self.notifier.on_failure(&job.target);
                }
                JobOutcome::Failure
            }
        }
    }
}
