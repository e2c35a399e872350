//! Entry Normalizer — canonical views derived from raw store contents.
//!
//! Normalized collections are always fully rederived from raw entries; they
//! are a pure function of store contents and never incrementally mutated.
//! The store already deduplicates by logID on merge, but the normalizer
//! re-enforces first-occurrence-wins dedup because it may be fed hand-edited
//! or legacy cache files.

use std::collections::HashSet;

use crate::types::RawEntry;

/// Marker used for fields the provider omitted.
///
/// Missing optional fields always map to this explicit empty value rather
/// than an `Option`, so display and search never have to null-check.
pub const MISSING: &str = "";

/// A normalized configuration-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub log_id: String,
    pub received_time: String,
    pub device_serial: String,
    pub device_name: String,
    pub source_host: String,
    pub command_type: String,
    pub admin: String,
    pub access_method: String,
    pub result: String,
    pub config_path: String,
    pub full_path: String,
}

impl ConfigEntry {
    /// True when the result text contains "fail" in any case variant.
    pub fn is_failed(&self) -> bool {
        self.result.to_ascii_lowercase().contains("fail")
    }

    /// Every field as a labelled string, for search and detail display.
    pub fn fields(&self) -> [(&'static str, &str); 11] {
        [
            ("Log ID", &self.log_id),
            ("Received", &self.received_time),
            ("Firewall Serial", &self.device_serial),
            ("Device Name", &self.device_name),
            ("Source IP", &self.source_host),
            ("Command Type", &self.command_type),
            ("Admin", &self.admin),
            ("Access Method", &self.access_method),
            ("Result", &self.result),
            ("Config Section", &self.config_path),
            ("Full Path", &self.full_path),
        ]
    }
}

/// A normalized system-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEntry {
    /// 1-based position at parse time. Not stable across re-parses.
    pub index: usize,
    pub log_id: String,
    pub time: String,
    pub event_type: String,
    pub severity: String,
    pub event_id: String,
    pub description: String,
    pub admin: String,
    pub host: String,
    pub client: String,
}

impl SystemEntry {
    /// Every field as a labelled string, for detail display.
    pub fn fields(&self) -> [(&'static str, &str); 9] {
        [
            ("Log ID", &self.log_id),
            ("Time", &self.time),
            ("Type", &self.event_type),
            ("Severity", &self.severity),
            ("Event", &self.event_id),
            ("Description", &self.description),
            ("Admin", &self.admin),
            ("Host", &self.host),
            ("Client", &self.client),
        ]
    }
}

fn text(raw: &RawEntry, name: &str) -> String {
    raw.field(name).unwrap_or(MISSING).to_string()
}

/// True when this entry should be emitted given the ids seen so far.
///
/// Entries without a logID cannot be identified and are never deduplicated.
fn first_occurrence(raw: &RawEntry, seen: &mut HashSet<String>) -> bool {
    raw.log_id.is_empty() || seen.insert(raw.log_id.clone())
}

/// Derive config entries from raw store contents, first logID occurrence wins.
pub fn normalize_config(raw: &[RawEntry]) -> Vec<ConfigEntry> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|entry| first_occurrence(entry, &mut seen))
        .map(|entry| ConfigEntry {
            log_id: entry.log_id.clone(),
            received_time: text(entry, "receive_time"),
            device_serial: text(entry, "serial"),
            device_name: text(entry, "device_name"),
            source_host: text(entry, "host"),
            command_type: text(entry, "cmd"),
            admin: text(entry, "admin"),
            access_method: text(entry, "client"),
            result: text(entry, "result"),
            config_path: text(entry, "path"),
            full_path: text(entry, "full-path"),
        })
        .collect()
}

/// Derive system entries from raw store contents, first logID occurrence wins.
pub fn normalize_system(raw: &[RawEntry]) -> Vec<SystemEntry> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|entry| first_occurrence(entry, &mut seen))
        .enumerate()
        .map(|(i, entry)| SystemEntry {
            index: i + 1,
            log_id: entry.log_id.clone(),
            time: text(entry, "time_generated"),
            event_type: text(entry, "type"),
            severity: text(entry, "severity"),
            event_id: text(entry, "eventid"),
            description: text(entry, "opaque"),
            admin: text(entry, "admin"),
            host: text(entry, "host"),
            client: text(entry, "client"),
        })
        .collect()
}

/// The subset of config entries whose result indicates a failure.
pub fn failed_commits(entries: &[ConfigEntry]) -> Vec<&ConfigEntry> {
    entries.iter().filter(|entry| entry.is_failed()).collect()
}
