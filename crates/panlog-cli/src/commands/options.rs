//! Options command - persistent display settings

use anyhow::Result;

use crate::commands::App;
use crate::output::OutputContext;

/// Show or change persistent display options.
pub fn options(app: &mut App, hide_appliance_admins: Option<bool>, ctx: &OutputContext) -> Result<()> {
    if let Some(value) = hide_appliance_admins {
        app.registry.hide_appliance_admins = value;
        app.save_registry()?;
    }
    ctx.info(&format!(
        "hide-appliance-admins: {}",
        app.registry.hide_appliance_admins
    ));
    Ok(())
}
