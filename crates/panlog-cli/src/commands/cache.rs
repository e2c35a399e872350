//! Cache and logout commands

use anyhow::Result;

use panlog_store::LogStore;

use crate::commands::App;
use crate::output::OutputContext;

/// Delete cached log files for the active profile, or for everything.
pub fn clear_cache(app: &App, all: bool, ctx: &OutputContext) -> Result<()> {
    if all {
        let removed = LogStore::clear_root(&app.cache_root)?;
        ctx.success(&format!("Removed {removed} cached log files"));
        return Ok(());
    }

    let session = app.session()?;
    app.store(&session)?.clear_all()?;
    ctx.success(&format!("Cleared the cache for {}", session.profile));
    Ok(())
}

/// Forget the active profile's token and delete its cached logs.
///
/// The profile entry stays in the registry so its id survives re-login.
pub fn logout(app: &mut App, ctx: &OutputContext) -> Result<()> {
    let session = app.session()?;

    app.store(&session)?.clear_all()?;
    if let Some(entry) = app.registry.profiles.get_mut(&session.profile) {
        entry.api_key.clear();
    }
    app.save_registry()?;

    ctx.success(&format!(
        "Logged out of {}; cached logs removed",
        session.profile
    ));
    Ok(())
}
