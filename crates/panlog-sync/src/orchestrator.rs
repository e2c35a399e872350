//! Orchestrator implementation

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use panlog_client::{ApplianceClient, JobPoll};
use panlog_core::{LogKind, Session};
use panlog_store::{LogStore, MergeMode};

use crate::chunk::{plan_chunks, ChunkPlan};
use crate::error::SyncError;

/// Polling and chunking constants for a sync run.
///
/// These are configuration, not computed values: the provider caps a single
/// request at 5000 entries, and the observed polling policy is up to 60
/// status checks two seconds apart.
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    /// Provider-side per-request entry ceiling.
    pub chunk_limit: u32,
    /// Maximum status checks per job before the chunk times out.
    pub poll_attempts: u32,
    /// Fixed delay between status checks.
    pub poll_interval: Duration,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            chunk_limit: 5000,
            poll_attempts: 60,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Progress notifications emitted during a sync run.
///
/// The orchestrator reports progress through a callback instead of doing any
/// presentation itself, so callers decide how (or whether) to display it.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A chunk's fetch job was accepted by the appliance.
    ChunkStarted {
        chunk: usize,
        chunks: usize,
        job_id: String,
    },
    /// A status check found the job still running.
    Polling {
        chunk: usize,
        attempt: u32,
        max_attempts: u32,
    },
    /// A chunk finished and its entries were merged.
    ChunkMerged { chunk: usize, accepted: usize },
}

/// Outcome of one chunk within a sync run.
#[derive(Debug)]
pub struct ChunkReport {
    pub chunk: usize,
    pub skip: u32,
    pub requested: Option<u32>,
    /// Accepted entry count, or the error that aborted this chunk.
    pub outcome: Result<usize, SyncError>,
}

/// Outcome of a whole sync run for one category.
#[derive(Debug)]
pub struct SyncResult {
    pub kind: LogKind,
    /// Total entries accepted into the store across all chunks.
    pub accepted: usize,
    pub chunks: Vec<ChunkReport>,
}

impl SyncResult {
    /// The first chunk error, if any chunk failed.
    pub fn error(&self) -> Option<&SyncError> {
        self.chunks
            .iter()
            .find_map(|report| report.outcome.as_ref().err())
    }

    /// True when every chunk merged successfully.
    pub fn is_complete(&self) -> bool {
        self.error().is_none()
    }

    /// True when at least one chunk merged and at least one failed.
    pub fn is_partial(&self) -> bool {
        !self.is_complete() && self.chunks.iter().any(|report| report.outcome.is_ok())
    }
}

/// Coordinates fetch jobs and store merges for one profile.
///
/// Chunks for the same category run strictly sequentially; the store's
/// incremental timestamp filter assumes they apply in order.
pub struct Orchestrator {
    client: ApplianceClient,
    store: LogStore,
    policy: SyncPolicy,
}

impl Orchestrator {
    pub fn new(client: ApplianceClient, store: LogStore) -> Self {
        Self {
            client,
            store,
            policy: SyncPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The store this orchestrator merges into.
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Fetch the provider-default window and merge it incrementally.
    pub async fn refresh(&self, session: &Session, kind: LogKind) -> SyncResult {
        let plan = vec![ChunkPlan {
            index: 0,
            max_count: None,
            skip: 0,
            mode: MergeMode::Incremental,
        }];
        self.run(session, kind, plan, |_| {}).await
    }

    /// Sync up to `total` entries, splitting into chunks above the ceiling.
    pub async fn sync(&self, session: &Session, kind: LogKind, total: u32) -> SyncResult {
        self.sync_with_progress(session, kind, total, |_| {}).await
    }

    /// Like [`Orchestrator::sync`], reporting progress through a callback.
    pub async fn sync_with_progress(
        &self,
        session: &Session,
        kind: LogKind,
        total: u32,
        progress: impl FnMut(Progress),
    ) -> SyncResult {
        let plans = plan_chunks(total, self.policy.chunk_limit);
        self.run(session, kind, plans, progress).await
    }

    #[instrument(skip(self, session, plans, progress), fields(profile = %session.profile, %kind))]
    async fn run(
        &self,
        session: &Session,
        kind: LogKind,
        plans: Vec<ChunkPlan>,
        mut progress: impl FnMut(Progress),
    ) -> SyncResult {
        let chunk_count = plans.len();
        let mut chunks = Vec::with_capacity(chunk_count);
        let mut accepted = 0;

        for plan in plans {
            let outcome = self
                .run_chunk(session, kind, &plan, chunk_count, &mut progress)
                .await;
            match &outcome {
                Ok(count) => {
                    accepted += count;
                    info!(chunk = plan.index, accepted = count, "chunk merged");
                }
                Err(err) => {
                    // Prior chunks' merged data is retained; this run becomes
                    // a partial success.
                    warn!(chunk = plan.index, error = %err, "chunk aborted");
                }
            }
            chunks.push(ChunkReport {
                chunk: plan.index,
                skip: plan.skip,
                requested: plan.max_count,
                outcome,
            });
        }

        SyncResult {
            kind,
            accepted,
            chunks,
        }
    }

    /// Run one chunk: start the job, poll within budget, merge on completion.
    async fn run_chunk(
        &self,
        session: &Session,
        kind: LogKind,
        plan: &ChunkPlan,
        chunk_count: usize,
        progress: &mut impl FnMut(Progress),
    ) -> Result<usize, SyncError> {
        let job = self
            .client
            .start_fetch(session, kind, plan.max_count, plan.skip)
            .await?;
        progress(Progress::ChunkStarted {
            chunk: plan.index,
            chunks: chunk_count,
            job_id: job.id().to_string(),
        });

        for attempt in 1..=self.policy.poll_attempts {
            match self.client.poll_job(session, kind, &job).await? {
                JobPoll::Completed(entries) => {
                    debug!(job_id = %job, received = entries.len(), "job finished");
                    let merged = self.store.merge_new(kind, entries, plan.mode)?;
                    progress(Progress::ChunkMerged {
                        chunk: plan.index,
                        accepted: merged,
                    });
                    return Ok(merged);
                }
                JobPoll::Failed(reason) => {
                    return Err(SyncError::JobFailed {
                        job_id: job.id().to_string(),
                        reason,
                    });
                }
                JobPoll::Pending => {
                    progress(Progress::Polling {
                        chunk: plan.index,
                        attempt,
                        max_attempts: self.policy.poll_attempts,
                    });
                    if attempt < self.policy.poll_attempts {
                        tokio::time::sleep(self.policy.poll_interval).await;
                    }
                }
            }
        }

        Err(SyncError::Timeout {
            job_id: job.id().to_string(),
            attempts: self.policy.poll_attempts,
        })
    }
}
