//! Error types for sync runs

use thiserror::Error;

/// Errors that can abort a single sync chunk.
///
/// All variants are recoverable at the orchestrator boundary: a failing
/// chunk is reported in the [`SyncResult`](crate::SyncResult) and never
/// terminates the process or rolls back previous chunks.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Transport, protocol, or API failure from the client
    #[error(transparent)]
    Client(#[from] panlog_client::ClientError),

    /// Store failure while merging results
    #[error(transparent)]
    Store(#[from] panlog_store::StoreError),

    /// The appliance reported the job as failed
    #[error("job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// The polling budget was exhausted before the job finished
    #[error("job {job_id} did not complete within {attempts} polls")]
    Timeout { job_id: String, attempts: u32 },
}
