//! On-disk store implementation

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use panlog_core::xml::{read_entries, write_store_document};
use panlog_core::{LogKind, RawEntry};

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to serialize the store document
    #[error("failed to encode store file: {0}")]
    Encode(String),

    /// No platform cache directory available
    #[error("could not determine a cache directory")]
    NoCacheDir,
}

/// How candidates are filtered during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Accept only candidates strictly newer than the latest persisted
    /// timestamp. Used for "most recent N" fetches, whose window overlaps
    /// the previous sync.
    Incremental,
    /// Accept all candidates. Used for skip-based pagination chunks, which
    /// return strictly older, non-overlapping windows by construction and
    /// would otherwise be wrongly rejected as "not newer than latest".
    Append,
}

/// Persistent, per-profile container of raw entries, one file per category.
///
/// Writes use exclusive single-writer discipline: syncs for the same profile
/// are user- or timer-triggered and never overlap, so no file locking is
/// needed. Files are written whole (temp file + rename) and never truncated
/// in place.
#[derive(Debug, Clone)]
pub struct LogStore {
    root: PathBuf,
    profile: String,
}

impl LogStore {
    /// Open (creating if needed) the store directory for a profile.
    pub fn open(root: impl Into<PathBuf>, profile: &str) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        restrict_dir_permissions(&root)?;
        Ok(Self {
            root,
            profile: profile.to_string(),
        })
    }

    /// The platform default cache root (`<cache_dir>/panlog`).
    pub fn default_root() -> Result<PathBuf, StoreError> {
        Ok(dirs::cache_dir()
            .ok_or(StoreError::NoCacheDir)?
            .join("panlog"))
    }

    /// The store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file path for one category of this profile.
    pub fn path(&self, kind: LogKind) -> PathBuf {
        let safe: String = self
            .profile
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect();
        self.root.join(format!("{safe}_raw_{kind}_log.xml"))
    }

    /// Load all persisted entries for a category.
    ///
    /// A missing file is an empty store. A corrupt file is also treated as an
    /// empty store: it is reported but never partially trusted, and the next
    /// successful merge supersedes it.
    pub fn load(&self, kind: LogKind) -> Result<Vec<RawEntry>, StoreError> {
        let path = self.path(kind);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        match read_entries(&text) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt store file, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Merge candidate entries into a category and persist the result.
    ///
    /// Returns the number of candidates accepted. After the mode-specific
    /// timestamp filter, candidates whose `logID` already exists in the store
    /// are dropped as a safety net against provider-side timestamp
    /// granularity collisions.
    pub fn merge_new(
        &self,
        kind: LogKind,
        candidates: Vec<RawEntry>,
        mode: MergeMode,
    ) -> Result<usize, StoreError> {
        let mut entries = self.load(kind)?;
        let latest = latest_timestamp(&entries).map(str::to_string);

        let mut seen: HashSet<String> = entries
            .iter()
            .filter(|entry| !entry.log_id.is_empty())
            .map(|entry| entry.log_id.clone())
            .collect();

        let mut accepted = 0;
        for candidate in candidates {
            if mode == MergeMode::Incremental {
                // Strictly greater than: an entry matching the latest
                // persisted timestamp was already seen by a prior sync.
                let newer = match (candidate.timestamp(), latest.as_deref()) {
                    (Some(ts), Some(latest)) => ts > latest,
                    (Some(_), None) => true,
                    (None, _) => false,
                };
                if !newer {
                    continue;
                }
            }
            if !candidate.log_id.is_empty() && !seen.insert(candidate.log_id.clone()) {
                continue;
            }
            entries.push(candidate);
            accepted += 1;
        }

        if accepted > 0 {
            self.save(kind, &entries)?;
        }
        debug!(%kind, accepted, total = entries.len(), "merged entries");
        Ok(accepted)
    }

    /// Remove the persisted file for one category. Succeeds if absent.
    pub fn clear(&self, kind: LogKind) -> Result<(), StoreError> {
        match fs::remove_file(self.path(kind)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove the persisted files for every category of this profile.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        for kind in LogKind::ALL {
            self.clear(kind)?;
        }
        Ok(())
    }

    /// Remove every cache file under a store root, across all profiles.
    ///
    /// Returns the number of files removed. Succeeds if the root is absent.
    pub fn clear_root(root: &Path) -> Result<usize, StoreError> {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            // Also picks up temp files orphaned by a crash mid-save.
            if path
                .extension()
                .is_some_and(|ext| ext == "xml" || ext == "tmp")
            {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Write the full document for a category: temp file, owner-only
    /// permissions, then atomic rename over the previous file.
    fn save(&self, kind: LogKind, entries: &[RawEntry]) -> Result<(), StoreError> {
        let bytes =
            write_store_document(entries).map_err(|err| StoreError::Encode(err.to_string()))?;
        let path = self.path(kind);
        let tmp = path.with_extension("xml.tmp");
        fs::write(&tmp, bytes)?;
        restrict_file_permissions(&tmp)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Latest (lexicographically greatest) timestamp among persisted entries.
///
/// String comparison is valid only because the timestamp format is a
/// fixed-width, zero-padded `YYYY/MM/DD HH:MM:SS` string.
fn latest_timestamp(entries: &[RawEntry]) -> Option<&str> {
    entries.iter().filter_map(RawEntry::timestamp).max()
}

#[cfg(unix)]
fn restrict_dir_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn restrict_file_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_file_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn entry(log_id: &str, ts: &str) -> RawEntry {
        RawEntry::new(log_id)
            .with_field("time_generated", ts)
            .with_field("admin", "alice")
    }

    fn store(dir: &TempDir) -> LogStore {
        LogStore::open(dir.path(), "panorama.example.net").unwrap()
    }

    #[test]
    fn load_of_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).load(LogKind::Config).unwrap().is_empty());
    }

    #[test]
    fn merge_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let accepted = store
            .merge_new(
                LogKind::System,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert_eq!(accepted, 1);
        let loaded = store.load(LogKind::System).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].log_id, "1");
    }

    #[test]
    fn incremental_merge_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let batch = vec![
            entry("1", "2024/03/01 10:00:00"),
            entry("2", "2024/03/01 10:05:00"),
        ];
        assert_eq!(
            store
                .merge_new(LogKind::Config, batch.clone(), MergeMode::Incremental)
                .unwrap(),
            2
        );
        // Identical remote window on the second sync: nothing re-absorbed.
        assert_eq!(
            store
                .merge_new(LogKind::Config, batch, MergeMode::Incremental)
                .unwrap(),
            0
        );
        assert_eq!(store.load(LogKind::Config).unwrap().len(), 2);
    }

    #[test]
    fn timestamp_equal_to_latest_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        // Strict greater-than, not greater-or-equal.
        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![entry("2", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert_eq!(accepted, 0);
    }

    #[test]
    fn incremental_drops_candidates_without_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![RawEntry::new("1").with_field("admin", "alice")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert_eq!(accepted, 0);
    }

    #[test]
    fn append_mode_accepts_older_windows() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        // Skip-based chunk: strictly older data, must not be timestamp-filtered.
        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![entry("0", "2024/02/01 10:00:00")],
                MergeMode::Append,
            )
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(store.load(LogKind::Config).unwrap().len(), 2);
    }

    #[test]
    fn duplicate_log_id_is_dropped_even_when_newer() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/02 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert_eq!(accepted, 0);
    }

    #[test]
    fn append_dedups_within_and_across_chunks() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Append,
            )
            .unwrap();
        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![
                    entry("1", "2024/03/01 10:00:00"),
                    entry("2", "2024/02/01 10:00:00"),
                    entry("2", "2024/02/01 10:00:00"),
                ],
                MergeMode::Append,
            )
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(store.load(LogKind::Config).unwrap().len(), 2);
    }

    #[test]
    fn corrupt_store_file_is_treated_as_empty_and_superseded() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(LogKind::Config), "<log><entry></log").unwrap();

        assert!(store.load(LogKind::Config).unwrap().is_empty());

        let accepted = store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(store.load(LogKind::Config).unwrap().len(), 1);
    }

    #[test]
    fn clear_is_idempotent_and_scoped_per_category() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        store
            .merge_new(
                LogKind::System,
                vec![entry("2", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();

        store.clear(LogKind::Config).unwrap();
        store.clear(LogKind::Config).unwrap();
        assert!(store.load(LogKind::Config).unwrap().is_empty());
        assert_eq!(store.load(LogKind::System).unwrap().len(), 1);
    }

    #[test]
    fn clear_root_removes_all_cache_files() {
        let dir = TempDir::new().unwrap();
        let first = LogStore::open(dir.path(), "alpha").unwrap();
        let second = LogStore::open(dir.path(), "beta").unwrap();
        for store in [&first, &second] {
            store
                .merge_new(
                    LogKind::Config,
                    vec![entry("1", "2024/03/01 10:00:00")],
                    MergeMode::Incremental,
                )
                .unwrap();
        }

        // An interrupted save leaves a temp file behind; it goes too.
        let orphan = dir.path().join("alpha_raw_config_log.xml.tmp");
        fs::write(&orphan, "partial").unwrap();

        assert_eq!(LogStore::clear_root(dir.path()).unwrap(), 3);
        assert_eq!(LogStore::clear_root(dir.path()).unwrap(), 0);
        assert!(first.load(LogKind::Config).unwrap().is_empty());
        assert!(!orphan.exists());
    }

    #[test]
    fn profiles_are_isolated_by_filename() {
        let dir = TempDir::new().unwrap();
        let first = LogStore::open(dir.path(), "panorama-a").unwrap();
        let second = LogStore::open(dir.path(), "panorama-b").unwrap();
        first
            .merge_new(
                LogKind::Config,
                vec![entry("1", "2024/03/01 10:00:00")],
                MergeMode::Incremental,
            )
            .unwrap();
        assert!(second.load(LogKind::Config).unwrap().is_empty());
    }

    #[test]
    fn profile_name_is_sanitized_for_filenames() {
        let dir = TempDir::new().unwrap();
        let store = LogStore::open(dir.path(), "10.0.0.1/../evil").unwrap();
        let path = store.path(LogKind::Config);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "10.0.0.1..evil_raw_config_log.xml"
        );
    }
}
