//! Profile registry handling for panlog

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use panlog_core::Session;

/// Saved appliance profiles plus display options.
///
/// Persisted as TOML in the platform config directory. Every field defaults,
/// so a hand-edited or truncated file still loads; a profile whose token was
/// stripped surfaces as a re-authentication error only when it is used.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Registry {
    /// Known profiles, keyed by appliance host
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    /// Host of the profile commands act on; empty means none
    #[serde(default)]
    pub active: String,
    /// Hide appliance-generated admins from grouped views
    #[serde(default)]
    pub hide_appliance_admins: bool,
}

/// One saved appliance profile
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfileEntry {
    /// API token from the keygen exchange; empty means logged out
    #[serde(default)]
    pub api_key: String,
    /// Numeric identifier assigned at login
    #[serde(default)]
    pub id: u64,
}

impl Registry {
    /// The default registry file path (`<config_dir>/panlog/config.toml`)
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine a config directory")?
            .join("panlog");
        Ok(config_dir.join("config.toml"))
    }

    /// Load the registry from a specific path; a missing file is empty.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Persist the registry, creating parent directories as needed.
    ///
    /// The file holds API tokens, so it is written owner-readable only.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to encode config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        restrict_permissions(path)?;
        Ok(())
    }

    /// Record a fresh login and make it the active profile.
    ///
    /// Re-login for a known host keeps its id; new hosts get the next free one.
    pub fn add_profile(&mut self, host: &str, api_key: String) -> u64 {
        let id = match self.profiles.get(host) {
            Some(existing) => existing.id,
            None => self.profiles.values().map(|p| p.id).max().unwrap_or(0) + 1,
        };
        self.profiles
            .insert(host.to_string(), ProfileEntry { api_key, id });
        self.active = host.to_string();
        id
    }

    /// Make a known profile the active one.
    pub fn switch(&mut self, host: &str) -> Result<()> {
        if !self.profiles.contains_key(host) {
            bail!("no profile named {host:?}; run `panlog login {host}` to add it");
        }
        self.active = host.to_string();
        Ok(())
    }

    /// Remove a profile. Clears the active marker if it pointed there.
    pub fn remove(&mut self, host: &str) -> Result<()> {
        if self.profiles.remove(host).is_none() {
            bail!("no profile named {host:?}");
        }
        if self.active == host {
            self.active = self.profiles.keys().next().cloned().unwrap_or_default();
        }
        Ok(())
    }

    /// Build a [`Session`] for the active profile.
    ///
    /// Distinguishes "nothing configured" from a corrupted or logged-out
    /// entry, and always points at the command that repairs the state.
    pub fn active_session(&self) -> Result<Session> {
        if self.active.is_empty() {
            bail!("no active profile; run `panlog login <host>` first");
        }
        let entry = self.profiles.get(&self.active).with_context(|| {
            format!(
                "active profile {:?} is missing from the registry; \
                 run `panlog profiles switch` or `panlog login {}`",
                self.active, self.active
            )
        })?;
        if entry.api_key.is_empty() {
            bail!(
                "profile {:?} has no stored token; re-authenticate with `panlog login {}`",
                self.active,
                self.active
            );
        }
        Ok(Session::new(&self.active, &entry.api_key, entry.id))
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_loads_as_empty_registry() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::load_from(&dir.path().join("config.toml")).unwrap();
        assert!(registry.profiles.is_empty());
        assert!(registry.active.is_empty());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panlog").join("config.toml");

        let mut registry = Registry::default();
        registry.add_profile("panorama-a", "key-a".to_string());
        registry.add_profile("panorama-b", "key-b".to_string());
        registry.hide_appliance_admins = true;
        registry.save_to(&path).unwrap();

        let loaded = Registry::load_from(&path).unwrap();
        assert_eq!(loaded.active, "panorama-b");
        assert_eq!(loaded.profiles.len(), 2);
        assert_eq!(loaded.profiles["panorama-a"].api_key, "key-a");
        assert!(loaded.hide_appliance_admins);
    }

    #[test]
    fn profile_ids_increment_and_survive_relogin() {
        let mut registry = Registry::default();
        let a = registry.add_profile("a", "key-1".to_string());
        let b = registry.add_profile("b", "key-2".to_string());
        assert_eq!((a, b), (1, 2));

        // Logging in again refreshes the token but keeps the id.
        let again = registry.add_profile("a", "key-3".to_string());
        assert_eq!(again, 1);
        assert_eq!(registry.profiles["a"].api_key, "key-3");
        assert_eq!(registry.active, "a");
    }

    #[test]
    fn active_session_requires_a_stored_token() {
        let mut registry = Registry::default();
        registry
            .profiles
            .insert("pan".to_string(), ProfileEntry::default());
        registry.active = "pan".to_string();

        let err = registry.active_session().unwrap_err().to_string();
        assert!(err.contains("re-authenticate"), "{err}");
    }

    #[test]
    fn active_session_reports_missing_profile_and_no_profile() {
        let registry = Registry::default();
        assert!(registry
            .active_session()
            .unwrap_err()
            .to_string()
            .contains("no active profile"));

        let mut registry = Registry::default();
        registry.active = "ghost".to_string();
        assert!(registry
            .active_session()
            .unwrap_err()
            .to_string()
            .contains("missing from the registry"));
    }

    #[test]
    fn remove_reassigns_or_clears_the_active_marker() {
        let mut registry = Registry::default();
        registry.add_profile("a", "k".to_string());
        registry.add_profile("b", "k".to_string());

        registry.remove("b").unwrap();
        assert_eq!(registry.active, "a");
        registry.remove("a").unwrap();
        assert!(registry.active.is_empty());
        assert!(registry.remove("a").is_err());
    }
}
