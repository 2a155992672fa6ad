// leech state managers
// Managers own shared state: the download store, the job queue, and the coordinator between them.

pub mod download_coordinator;
pub mod download_store;
pub mod job_queue;
