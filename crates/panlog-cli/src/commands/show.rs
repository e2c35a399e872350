//! Show command - grouped views over the cached logs

use anyhow::{bail, Result};
use clap::ValueEnum;

use panlog_core::normalize::{failed_commits, normalize_config, normalize_system, ConfigEntry};
use panlog_core::query::group_by;
use panlog_core::LogKind;

use crate::commands::App;
use crate::output::{print_config_groups, print_failed_groups, print_system_groups, OutputContext};

/// Prefix of admin names the appliance generates for its own actions
const APPLIANCE_ADMIN_PREFIX: &str = "Panorama-";

/// Which cached view to display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Configuration audit log, grouped by a chosen field
    #[default]
    Config,
    /// System event log, grouped by severity
    System,
    /// Failed commits only, grouped by admin
    Failed,
}

/// Display a grouped view of the cached logs for the active profile.
pub fn show(app: &App, view: View, group: Option<&str>, ctx: &OutputContext) -> Result<()> {
    let session = app.session()?;
    let store = app.store(&session)?;

    match view {
        View::Config => {
            let raw = store.load(LogKind::Config)?;
            let mut entries = normalize_config(&raw);
            if app.registry.hide_appliance_admins {
                entries.retain(|entry| !entry.admin.starts_with(APPLIANCE_ADMIN_PREFIX));
            }
            let label = group.unwrap_or("Admin");
            let key = config_field_key(&entries, label)?;
            let groups = group_by(&entries, |entry: &ConfigEntry| key(entry));
            // The default Admin view drills down into command types.
            let nested = label.eq_ignore_ascii_case("Admin");
            print_config_groups(ctx, &groups, nested);
        }
        View::System => {
            let raw = store.load(LogKind::System)?;
            let entries = normalize_system(&raw);
            let groups = group_by(&entries, |entry| entry.severity.clone());
            print_system_groups(ctx, &groups);
        }
        View::Failed => {
            let raw = store.load(LogKind::Config)?;
            let entries = normalize_config(&raw);
            let failed = failed_commits(&entries);
            let groups = group_by(&failed, |entry| entry.admin.clone());
            print_failed_groups(ctx, &groups);
        }
    }
    Ok(())
}

/// Resolve a field label (case-insensitive) into a key extractor.
fn config_field_key(
    entries: &[ConfigEntry],
    label: &str,
) -> Result<impl Fn(&ConfigEntry) -> String> {
    let probe = entries.first().cloned().unwrap_or_else(|| ConfigEntry {
        log_id: String::new(),
        received_time: String::new(),
        device_serial: String::new(),
        device_name: String::new(),
        source_host: String::new(),
        command_type: String::new(),
        admin: String::new(),
        access_method: String::new(),
        result: String::new(),
        config_path: String::new(),
        full_path: String::new(),
    });
    let position = probe
        .fields()
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(label));
    match position {
        Some(index) => Ok(move |entry: &ConfigEntry| entry.fields()[index].1.to_string()),
        None => {
            let known: Vec<&str> = probe.fields().iter().map(|(name, _)| *name).collect();
            bail!("unknown field {label:?}; one of: {}", known.join(", "));
        }
    }
}
