//! End-to-end orchestrator tests against the fake appliance.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use panlog_client::testing::{FakeAppliance, FakeState, JobScript};
use panlog_core::{LogKind, RawEntry, Session};
use panlog_store::LogStore;
use panlog_sync::{Orchestrator, SyncError, SyncPolicy};

const KEY: &str = "LUFRPT-testkey";

/// Second offsets rendered in the fixed, lexicographically-sortable format.
fn ts(seconds: u32) -> String {
    format!(
        "2024/03/01 {:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

fn entry(id: u32, seconds: u32) -> RawEntry {
    RawEntry::new(id.to_string())
        .with_field("time_generated", ts(seconds))
        .with_field("admin", "alice")
        .with_field("cmd", "set")
}

fn window(ids: std::ops::Range<u32>) -> Vec<RawEntry> {
    ids.map(|id| entry(id, id)).collect()
}

async fn harness(state: FakeState) -> (FakeAppliance, Orchestrator, TempDir, Session) {
    let server = FakeAppliance::start(state).await.unwrap();
    let dir = TempDir::new().unwrap();
    let store = LogStore::open(dir.path(), "test-appliance").unwrap();
    let session = Session::new(server.host(), KEY, 1);
    let orchestrator = Orchestrator::new(server.client().unwrap(), store);
    (server, orchestrator, dir, session)
}

fn fast_policy(chunk_limit: u32, poll_attempts: u32) -> SyncPolicy {
    SyncPolicy {
        chunk_limit,
        poll_attempts,
        poll_interval: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn small_sync_issues_a_single_fetch() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(0..100));
    let (server, orchestrator, _dir, session) = harness(state).await;

    let result = orchestrator.sync(&session, LogKind::Config, 100).await;
    assert!(result.is_complete());
    assert_eq!(result.accepted, 100);

    let state = server.state();
    let state = state.lock().unwrap();
    assert_eq!(state.fetches.len(), 1);
    assert_eq!(state.fetches[0].nlogs, Some(100));
    assert_eq!(state.fetches[0].skip, 0);
}

#[tokio::test]
async fn refresh_requests_the_provider_default_window() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(0..10));
    let (server, orchestrator, _dir, session) = harness(state).await;

    let result = orchestrator.refresh(&session, LogKind::System).await;
    assert_eq!(result.accepted, 10);

    let state = server.state();
    let state = state.lock().unwrap();
    assert_eq!(state.fetches[0].nlogs, None);
}

#[tokio::test]
async fn repeated_sync_with_identical_remote_data_adds_nothing() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(0..50));
    state.enqueue_entries(window(0..50));
    let (_server, orchestrator, _dir, session) = harness(state).await;

    let first = orchestrator.sync(&session, LogKind::Config, 50).await;
    let second = orchestrator.sync(&session, LogKind::Config, 50).await;

    assert_eq!(first.accepted, 50);
    assert_eq!(second.accepted, 0);
    assert!(second.is_complete());
    let stored = orchestrator.store().load(LogKind::Config).unwrap();
    assert_eq!(stored.len(), 50);
}

#[tokio::test]
async fn ten_thousand_entry_history_merges_across_two_chunks() {
    // Chunk 1 is the most recent 5000 entries, chunk 2 the older 5000
    // reached with skip=5000. The union must land without duplicates.
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(5000..10000));
    state.enqueue_entries(window(0..5000));
    let (server, orchestrator, _dir, session) = harness(state).await;

    let result = orchestrator.sync(&session, LogKind::Config, 10000).await;
    assert!(result.is_complete());
    assert_eq!(result.accepted, 10000);
    assert_eq!(result.chunks.len(), 2);

    let stored = orchestrator.store().load(LogKind::Config).unwrap();
    assert_eq!(stored.len(), 10000);
    let distinct: std::collections::HashSet<&str> =
        stored.iter().map(|e| e.log_id.as_str()).collect();
    assert_eq!(distinct.len(), 10000);

    let state = server.state();
    let state = state.lock().unwrap();
    assert_eq!(state.fetches.len(), 2);
    assert_eq!((state.fetches[0].nlogs, state.fetches[0].skip), (Some(5000), 0));
    assert_eq!(
        (state.fetches[1].nlogs, state.fetches[1].skip),
        (Some(5000), 5000)
    );
}

#[tokio::test]
async fn overlapping_chunks_do_not_duplicate_log_ids() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(4..8));
    // Older window overlaps the first chunk by two ids.
    state.enqueue_entries(window(2..6));
    let (_server, orchestrator, _dir, session) = harness(state).await;
    let orchestrator = orchestrator.with_policy(fast_policy(4, 5));

    let result = orchestrator.sync(&session, LogKind::Config, 8).await;

    assert!(result.is_complete());
    assert_eq!(result.accepted, 6);
    let stored = orchestrator.store().load(LogKind::Config).unwrap();
    let distinct: std::collections::HashSet<&str> =
        stored.iter().map(|e| e.log_id.as_str()).collect();
    assert_eq!(stored.len(), 6);
    assert_eq!(distinct.len(), 6);
}

#[tokio::test]
async fn chunk_failure_keeps_prior_chunks_and_reports_partial_success() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(2..4));
    state.enqueue(JobScript::fails("query aborted on the appliance"));
    let (_server, orchestrator, _dir, session) = harness(state).await;
    let orchestrator = orchestrator.with_policy(fast_policy(2, 5));

    let result = orchestrator.sync(&session, LogKind::Config, 4).await;

    assert!(result.is_partial());
    assert_eq!(result.accepted, 2);
    assert!(result.chunks[0].outcome.is_ok());
    assert!(matches!(
        result.chunks[1].outcome,
        Err(SyncError::JobFailed { .. })
    ));
    // Merged data from the first chunk is retained, not rolled back.
    assert_eq!(orchestrator.store().load(LogKind::Config).unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn polling_budget_exhaustion_is_a_timeout_not_a_crash() {
    let mut state = FakeState::new(KEY);
    state.enqueue(JobScript::never_finishes());
    let (_server, orchestrator, _dir, session) = harness(state).await;
    let orchestrator = orchestrator.with_policy(SyncPolicy {
        chunk_limit: 5000,
        poll_attempts: 3,
        poll_interval: Duration::from_secs(2),
    });

    let result = orchestrator.sync(&session, LogKind::System, 10).await;

    assert!(!result.is_complete());
    assert!(matches!(
        result.error(),
        Some(SyncError::Timeout { attempts: 3, .. })
    ));
    assert!(orchestrator.store().load(LogKind::System).unwrap().is_empty());
}

#[tokio::test]
async fn progress_reports_polls_and_merges() {
    let mut state = FakeState::new(KEY);
    state.enqueue(JobScript::finishes_with(window(0..3)).after_polls(2));
    let (_server, orchestrator, _dir, session) = harness(state).await;
    let orchestrator = orchestrator.with_policy(fast_policy(5000, 10));

    let mut polls = 0;
    let mut merged = None;
    let result = orchestrator
        .sync_with_progress(&session, LogKind::Config, 3, |event| match event {
            panlog_sync::Progress::Polling { attempt, .. } => polls = polls.max(attempt),
            panlog_sync::Progress::ChunkMerged { accepted, .. } => merged = Some(accepted),
            panlog_sync::Progress::ChunkStarted { .. } => {}
        })
        .await;

    assert!(result.is_complete());
    assert_eq!(polls, 2);
    assert_eq!(merged, Some(3));
}

#[tokio::test]
async fn categories_use_disjoint_stores() {
    let mut state = FakeState::new(KEY);
    state.enqueue_entries(window(0..5));
    state.enqueue_entries(window(0..5));
    let (_server, orchestrator, _dir, session) = harness(state).await;

    orchestrator.sync(&session, LogKind::Config, 5).await;
    orchestrator.sync(&session, LogKind::System, 5).await;

    assert_eq!(orchestrator.store().load(LogKind::Config).unwrap().len(), 5);
    assert_eq!(orchestrator.store().load(LogKind::System).unwrap().len(), 5);
}
