//! Profiles command - list, switch, and remove saved profiles

use anyhow::Result;

use crate::commands::App;
use crate::output::{OutputContext, ProfileRow};

/// List every saved profile, marking the active one.
pub fn profiles_list(app: &App, ctx: &OutputContext) {
    let rows: Vec<ProfileRow> = app
        .registry
        .profiles
        .iter()
        .map(|(host, entry)| ProfileRow {
            active: if *host == app.registry.active {
                "*".to_string()
            } else {
                String::new()
            },
            host: host.clone(),
            id: entry.id,
            token: if entry.api_key.is_empty() {
                "missing".to_string()
            } else {
                "stored".to_string()
            },
        })
        .collect();
    ctx.print(&rows);
}

/// Make another saved profile the active one.
pub fn profiles_switch(app: &mut App, host: &str, ctx: &OutputContext) -> Result<()> {
    app.registry.switch(host)?;
    app.save_registry()?;
    // Surface a stripped token now rather than on the next sync.
    if let Err(err) = app.registry.active_session() {
        ctx.warn(&format!("switched to {host}, but: {err}"));
    } else {
        ctx.success(&format!("Active profile is now {host}"));
    }
    Ok(())
}

/// Remove a saved profile and its cached logs.
pub fn profiles_remove(app: &mut App, host: &str, ctx: &OutputContext) -> Result<()> {
    app.registry.remove(host)?;
    app.save_registry()?;

    let store = panlog_store::LogStore::open(&app.cache_root, host)?;
    store.clear_all()?;

    if app.registry.active.is_empty() {
        ctx.info(&format!("Removed {host}; no profiles remain"));
    } else {
        ctx.info(&format!(
            "Removed {host}; active profile is now {}",
            app.registry.active
        ));
    }
    Ok(())
}
