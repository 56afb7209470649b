//! Durable snapshots of the counter table
//!
//! The whole table lives in one JSON object. Every save replaces the file
//! atomically: the snapshot goes to a temporary sibling first, is synced, and
//! is then renamed over the target. A failed save leaves the previous snapshot
//! untouched.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Mapping from counter key to its current value
///
/// Absent keys count as 0.
#[derive(Clone, PartialEq, Eq, Default, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterTable(HashMap<String, u64>);

impl CounterTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`
    #[inline]
    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Install `value` for `key`
    #[inline]
    pub fn insert(&mut self, key: &str, value: u64) {
        self.0.insert(key.to_owned(), value);
    }

    /// Number of keys with a stored value
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no key has a stored value
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u64)> for CounterTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Load the table stored at `path`
///
/// A missing file yields an empty table. A file that exists but cannot be read
/// or parsed (an empty file included) is an error.
pub fn load(path: &Path) -> Result<CounterTable> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CounterTable::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_owned(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
        path: path.to_owned(),
        source,
    })
}

/// Replace the snapshot at `path` with `table`
pub fn save(path: &Path, table: &CounterTable) -> Result<()> {
    let persist_err = |source| StoreError::Persist {
        path: path.to_owned(),
        source,
    };

    let data = serde_json::to_vec(table).map_err(|e| persist_err(e.into()))?;
    let tmp = temp_path(path);

    if let Err(e) = write_synced(&tmp, &data).and_then(|()| fs::rename(&tmp, path)) {
        error!(path = %path.display(), error = %e, "failed to persist counters");
        // The target was never touched, only the temporary file may be left over
        let _ = fs::remove_file(&tmp);
        return Err(persist_err(e));
    }

    // The snapshot is in place at this point, a failure here only weakens
    // durability across power loss
    if let Err(e) = sync_parent(path) {
        warn!(path = %path.display(), error = %e, "failed to sync storage directory");
    }
    Ok(())
}

/// Unique sibling of `path` to stage a snapshot in
///
/// Staying in the same directory keeps the final rename on one file system.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("counters"));
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => File::open(dir)?.sync_all(),
        _ => Ok(()),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u64)]) -> CounterTable {
        entries.iter().map(|&(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load(&dir.path().join("counters.json")).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn empty_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        File::create(&path).unwrap();

        assert!(matches!(load(&path), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn malformed_files_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        for content in [
            "not json",
            "[1, 2, 3]",
            r#"{"a": -1}"#,
            r#"{"a": "1"}"#,
            r#"{"a": 1.5}"#,
            r#"{"a": 1"#,
        ] {
            fs::write(&path, content).unwrap();
            assert!(
                matches!(load(&path), Err(StoreError::Corrupt { .. })),
                "{content:?} must not load"
            );
        }
    }

    #[test]
    fn unreadable_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists at the path but is not a file
        assert!(matches!(load(dir.path()), Err(StoreError::Read { .. })));
    }

    #[test]
    fn empty_object_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        fs::write(&path, "{}").unwrap();

        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        let saved = table(&[("a", 3), ("b", 1), ("build/x", 300)]);

        save(&path, &saved).unwrap();
        assert_eq!(load(&path).unwrap(), saved);
    }

    #[test]
    fn save_supersedes_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        save(&path, &table(&[("a", 1), ("b", 2)])).unwrap();
        save(&path, &table(&[("a", 5)])).unwrap();

        assert_eq!(load(&path).unwrap(), table(&[("a", 5)]));
    }

    #[test]
    fn save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");

        for i in 0..5 {
            save(&path, &table(&[("a", i)])).unwrap();
        }

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["counters.json"]);
    }

    #[test]
    fn failed_save_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.json");
        save(&path, &table(&[("a", 1)])).unwrap();

        // Renaming a file over a non-empty directory fails
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("occupant"), "x").unwrap();
        assert!(matches!(
            save(&blocked, &table(&[("a", 2)])),
            Err(StoreError::Persist { .. })
        ));

        assert_eq!(load(&path).unwrap(), table(&[("a", 1)]));
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                let name = entry.as_ref().unwrap().file_name();
                name.to_string_lossy().ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("counters.json");

        assert!(matches!(
            save(&path, &table(&[("a", 1)])),
            Err(StoreError::Persist { .. })
        ));
        assert!(!path.exists());
    }
}
