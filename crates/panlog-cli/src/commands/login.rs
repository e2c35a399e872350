//! Login command - authenticate against an appliance and save the profile

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::commands::App;
use crate::output::OutputContext;

/// Exchange credentials for a token and make the host the active profile.
pub async fn login(
    app: &mut App,
    host: &str,
    user: &str,
    password: Option<String>,
    ctx: &OutputContext,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };
    if password.is_empty() {
        bail!("empty password");
    }

    let client = app.client_for(host)?;
    let key = client
        .keygen(user, &password)
        .await
        .with_context(|| format!("authentication against {host} failed"))?;

    let id = app.registry.add_profile(host, key);
    app.save_registry()?;
    ctx.success(&format!("Logged in to {host}; profile #{id} is now active"));
    Ok(())
}

fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
