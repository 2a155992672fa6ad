//! Job Queue for leech.
//!
//! Runs background jobs on the tokio runtime under a unique integer key.
//! At most one live job exists per key; what happens to a second enqueue
//! is decided by [`ExistingJobPolicy`]. Concurrency is bounded by a
//! semaphore, and cancellation aborts the job's task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::job::{ExistingJobPolicy, ForegroundInfo, JobData, JobOutcome, JobState};

/// The unit of work the queue executes for every job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, ctx: &JobContext) -> JobOutcome;
}

/// Trait defining the job queue contract used by the coordinator and facade.
pub trait JobQueueTrait: Send + Sync {
    /// Schedules a job under `key`. Returns `false` when the policy kept an existing job.
    fn enqueue_unique(&self, key: i32, policy: ExistingJobPolicy, data: JobData) -> bool;
    fn cancel_unique(&self, key: i32);
    fn cancel_all(&self);
}

/// Shared state of one scheduled job.
struct JobSlot {
    state: watch::Sender<JobState>,
    foreground: Mutex<Option<ForegroundInfo>>,
}

impl JobSlot {
    fn new() -> Self {
        let (state, _rx) = watch::channel(JobState::Enqueued);
        Self {
            state,
            foreground: Mutex::new(None),
        }
    }

    fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Moves to `next` unless the job already finished.
    fn transition(&self, next: JobState) -> bool {
        self.state.send_if_modified(|current| {
            if current.is_finished() {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}

/// Handle given to a running job: its key, its input, and a way to
/// publish a long-running foreground indication.
pub struct JobContext {
    key: i32,
    data: JobData,
    slot: Arc<JobSlot>,
}

impl JobContext {
    pub fn key(&self) -> i32 {
        self.key
    }

    pub fn data(&self) -> &JobData {
        &self.data
    }

    pub fn set_foreground(&self, info: ForegroundInfo) {
        if let Ok(mut fg) = self.slot.foreground.lock() {
            *fg = Some(info);
        }
    }
}

struct JobEntry {
    slot: Arc<JobSlot>,
    handle: JoinHandle<()>,
}

impl JobEntry {
    fn cancel(&self) {
        if self.slot.transition(JobState::Cancelled) {
            self.handle.abort();
        }
    }
}

/// Tokio-backed job queue.
pub struct JobQueue {
    handler: Arc<dyn JobHandler>,
    permits: Arc<Semaphore>,
    jobs: Mutex<HashMap<i32, JobEntry>>,
}

impl JobQueue {
    /// Creates a queue that runs at most `max_concurrent` jobs at a time.
    pub fn new(handler: Arc<dyn JobHandler>, max_concurrent: usize) -> Self {
        Self {
            handler,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: i32) -> Option<Arc<JobSlot>> {
        let jobs = self.jobs.lock().ok()?;
        jobs.get(&key).map(|entry| entry.slot.clone())
    }

    /// Number of jobs the queue still tracks. Finished jobs are dropped on
    /// the next enqueue.
    pub fn tracked_jobs(&self) -> usize {
        self.jobs.lock().map(|jobs| jobs.len()).unwrap_or(0)
    }

    /// Latest state of the job scheduled under `key`, if any.
    pub fn job_state(&self, key: i32) -> Option<JobState> {
        self.slot(key).map(|slot| slot.state())
    }

    /// Latest foreground indication published by the job under `key`.
    pub fn foreground_info(&self, key: i32) -> Option<ForegroundInfo> {
        let slot = self.slot(key)?;
        let fg = slot.foreground.lock().ok()?;
        fg.clone()
    }

    /// Waits until the job under `key` finishes and returns its final state.
    pub async fn wait_for(&self, key: i32) -> Option<JobState> {
        let mut rx = self.slot(key)?.state.subscribe();
        let state = rx.wait_for(|state| state.is_finished()).await.ok()?;
        Some(*state)
    }

    fn spawn(&self, key: i32, data: JobData) -> JobEntry {
        let slot = Arc::new(JobSlot::new());
        let ctx = JobContext {
            key,
            data,
            slot: slot.clone(),
        };
        let handler = self.handler.clone();
        let permits = self.permits.clone();

        let handle = tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    ctx.slot.transition(JobState::Cancelled);
                    return;
                }
            };
            if !ctx.slot.transition(JobState::Running) {
                return;
            }
            debug!(key, "job started");
            let final_state = match handler.run(&ctx).await {
                JobOutcome::Success => JobState::Succeeded,
                JobOutcome::Failure => JobState::Failed,
            };
            ctx.slot.transition(final_state);
            debug!(key, state = ?final_state, "job finished");
        });

        JobEntry { slot, handle }
    }
}

impl JobQueueTrait for JobQueue {
    fn enqueue_unique(&self, key: i32, policy: ExistingJobPolicy, data: JobData) -> bool {
        let mut jobs = match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(_) => {
                warn!(key, "job table lock poisoned, dropping enqueue");
                return false;
            }
        };

        let before = jobs.len();
        jobs.retain(|_, entry| !entry.slot.state().is_finished());
        if jobs.len() < before {
            debug!(pruned = before - jobs.len(), "dropped finished jobs");
        }

        if let Some(existing) = jobs.get(&key) {
            if !existing.slot.state().is_finished() {
                match policy {
                    ExistingJobPolicy::Keep => {
                        debug!(key, "job already scheduled, keeping existing");
                        return false;
                    }
                    ExistingJobPolicy::Replace => {
                        info!(key, "replacing scheduled job");
                        existing.cancel();
                    }
                }
            }
        }

        let entry = self.spawn(key, data);
        jobs.insert(key, entry);
        true
    }

    fn cancel_unique(&self, key: i32) {
        if let Ok(jobs) = self.jobs.lock() {
            if let Some(entry) = jobs.get(&key) {
                info!(key, "cancelling job");
                entry.cancel();
            }
        }
    }

    fn cancel_all(&self) {
        if let Ok(jobs) = self.jobs.lock() {
            info!(count = jobs.len(), "cancelling all jobs");
            for entry in jobs.values() {
                entry.cancel();
            }
        }
    }
}
