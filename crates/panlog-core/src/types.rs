//! Raw record model shared by the client, store, and normalizer.

use std::fmt;
use std::str::FromStr;

/// Which appliance log category an entry belongs to.
///
/// The two categories are disjoint stores with no shared state; they are
/// always synced and parsed independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    /// Configuration-change audit log.
    Config,
    /// System event log.
    System,
}

impl LogKind {
    /// All known categories, in sync order.
    pub const ALL: [LogKind; 2] = [LogKind::Config, LogKind::System];

    /// The `log-type` value used on the wire and in cache filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Config => "config",
            LogKind::System => "system",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "config" => Ok(LogKind::Config),
            "system" => Ok(LogKind::System),
            other => Err(format!("unknown log category: {other}")),
        }
    }
}

/// One raw log record as returned by the appliance API.
///
/// Raw entries are immutable once received. The provider-assigned `logid`
/// attribute is the dedup identity within a category; child elements are kept
/// verbatim, in document order, so the store can round-trip entries without
/// understanding them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Provider-assigned identifier. Empty when the provider omitted it;
    /// such entries are never deduplicated.
    pub log_id: String,
    /// Child elements in document order, as `(name, text)` pairs.
    pub fields: Vec<(String, String)>,
}

impl RawEntry {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append, mainly for tests and fixtures.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Text of the first field with the given name, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The timestamp used by merge-by-recency.
    ///
    /// System entries carry `time_generated`, config entries `receive_time`;
    /// some providers emit both, in which case `time_generated` wins. The
    /// value is a fixed-width `YYYY/MM/DD HH:MM:SS` string, which makes
    /// lexicographic comparison equivalent to chronological comparison. That
    /// format is an invariant of the appliance API; if it ever changes,
    /// comparisons must move to a parsed timestamp type.
    pub fn timestamp(&self) -> Option<&str> {
        self.field("time_generated").or_else(|| self.field("receive_time"))
    }
}
