//! panlog-core - Core types and pure logic for the panlog log engine
//!
//! This crate holds everything shared between the API client, the on-disk
//! store, the sync orchestrator, and the CLI:
//!
//! - [`RawEntry`] / [`LogKind`] — the raw record model as received from the
//!   appliance log API and persisted in the store
//! - [`xml`] — the encode/decode boundary for the appliance wire format and
//!   the store file format
//! - [`normalize`] — derivation of canonical [`ConfigEntry`] / [`SystemEntry`]
//!   views from raw entries, including logID dedup and failure classification
//! - [`query`] — case-insensitive full-field search and stable grouping
//! - [`Session`] — an explicit per-profile session handle passed into client
//!   and orchestrator calls, so multiple profiles can coexist without
//!   touching shared mutable state

pub mod normalize;
pub mod query;
pub mod session;
pub mod types;
pub mod xml;

pub use normalize::{failed_commits, normalize_config, normalize_system, ConfigEntry, SystemEntry};
pub use query::{group_by, search};
pub use session::Session;
pub use types::{LogKind, RawEntry};
