//! Command implementations for panlog

pub mod cache;
pub mod login;
pub mod options;
pub mod profiles;
pub mod search;
pub mod show;
pub mod sync;

pub use cache::{clear_cache, logout};
pub use login::login;
pub use options::options;
pub use profiles::{profiles_list, profiles_remove, profiles_switch};
pub use search::search;
pub use show::{show, View};
pub use sync::{refresh, sync, Category};

use std::path::PathBuf;

use anyhow::{Context, Result};

use panlog_client::ApplianceClient;
use panlog_core::Session;
use panlog_store::LogStore;
use panlog_sync::Orchestrator;

use crate::config::Registry;

/// Resolved application state shared by every command.
pub struct App {
    pub registry: Registry,
    pub registry_path: PathBuf,
    pub cache_root: PathBuf,
    pub insecure: bool,
}

impl App {
    /// The session for the active profile.
    pub fn session(&self) -> Result<Session> {
        self.registry.active_session()
    }

    /// Build a client for an arbitrary host, honoring the TLS flag.
    pub fn client_for(&self, host: &str) -> Result<ApplianceClient> {
        let client = if self.insecure {
            ApplianceClient::insecure(host)
        } else {
            ApplianceClient::new(host)
        };
        client.with_context(|| format!("failed to create a client for {host}"))
    }

    /// Open the cache store for a session's profile.
    pub fn store(&self, session: &Session) -> Result<LogStore> {
        LogStore::open(&self.cache_root, &session.profile)
            .with_context(|| format!("failed to open cache at {}", self.cache_root.display()))
    }

    /// Build a sync orchestrator for a session's profile.
    pub fn orchestrator(&self, session: &Session) -> Result<Orchestrator> {
        Ok(Orchestrator::new(
            self.client_for(&session.profile)?,
            self.store(session)?,
        ))
    }

    pub fn save_registry(&self) -> Result<()> {
        self.registry.save_to(&self.registry_path)
    }
}
