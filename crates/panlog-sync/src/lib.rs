//! panlog-sync - Sync Orchestrator
//!
//! Coordinates fetch jobs against the appliance API and merges their results
//! into the local store. The orchestrator owns everything the client
//! deliberately does not: chunking requests above the provider's per-request
//! ceiling, the bounded poll/retry loop with its fixed delay, and per-chunk
//! outcome reporting. A chunk failure never rolls back previously merged
//! chunks; the run is reported as a partial success instead.
//!
//! The orchestrator does not re-derive normalized views; after a sync the
//! caller re-runs the normalizer over store contents.

mod chunk;
mod error;
mod orchestrator;

pub use chunk::{plan_chunks, ChunkPlan};
pub use error::SyncError;
pub use orchestrator::{ChunkReport, Orchestrator, Progress, SyncPolicy, SyncResult};
