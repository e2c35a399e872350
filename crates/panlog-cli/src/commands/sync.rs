//! Sync and refresh commands - pull new log entries into the cache

use anyhow::{bail, Result};
use clap::ValueEnum;
use tracing::debug;

use panlog_core::LogKind;
use panlog_sync::{Progress, SyncResult};

use crate::commands::App;
use crate::output::OutputContext;

/// Which log categories a sync command touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// Configuration audit log only
    Config,
    /// System event log only
    System,
    /// Both categories (default)
    #[default]
    All,
}

impl Category {
    pub fn kinds(self) -> &'static [LogKind] {
        match self {
            Category::Config => &[LogKind::Config],
            Category::System => &[LogKind::System],
            Category::All => &LogKind::ALL,
        }
    }
}

/// Sync up to `count` entries per selected category.
pub async fn sync(app: &App, count: u32, category: Category, ctx: &OutputContext) -> Result<()> {
    let session = app.session()?;
    let orchestrator = app.orchestrator(&session)?;

    let mut dead_categories = Vec::new();
    for &kind in category.kinds() {
        let result = orchestrator
            .sync_with_progress(&session, kind, count, |event| match event {
                Progress::ChunkStarted { chunk, chunks, .. } => {
                    if chunks > 1 {
                        ctx.info(&format!("{kind}: fetching chunk {}/{chunks}", chunk + 1));
                    }
                }
                Progress::Polling {
                    attempt,
                    max_attempts,
                    ..
                } => debug!(%kind, attempt, max_attempts, "waiting for job"),
                Progress::ChunkMerged { .. } => {}
            })
            .await;
        if report(ctx, &result) {
            dead_categories.push(kind);
        }
    }

    if !dead_categories.is_empty() {
        bail!("sync produced no data for: {dead_categories:?}");
    }
    Ok(())
}

/// Drop the selected caches and fetch the provider-default window afresh.
pub async fn refresh(app: &App, category: Category, ctx: &OutputContext) -> Result<()> {
    let session = app.session()?;
    let orchestrator = app.orchestrator(&session)?;

    let mut dead_categories = Vec::new();
    for &kind in category.kinds() {
        orchestrator.store().clear(kind)?;
        let result = orchestrator.refresh(&session, kind).await;
        if report(ctx, &result) {
            dead_categories.push(kind);
        }
    }

    if !dead_categories.is_empty() {
        bail!("refresh produced no data for: {dead_categories:?}");
    }
    Ok(())
}

/// Print a per-category summary. Returns true when the run achieved nothing.
fn report(ctx: &OutputContext, result: &SyncResult) -> bool {
    if result.is_complete() {
        ctx.success(&format!(
            "{}: {} new entries",
            result.kind, result.accepted
        ));
        return false;
    }

    // Merged chunks are kept even when a later chunk fails, so a partial
    // run still made progress worth reporting.
    let error = result
        .error()
        .map(|err| err.to_string())
        .unwrap_or_default();
    if result.is_partial() {
        ctx.warn(&format!(
            "{}: partial sync, {} new entries kept ({error})",
            result.kind, result.accepted
        ));
        false
    } else {
        ctx.warn(&format!("{}: sync failed ({error})", result.kind));
        true
    }
}
