//! Implementation of the durable counter store

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, info};

use crate::error::{Result, StoreError};
use crate::persistence::{self, CounterTable};

/// Durable store handing out strictly increasing tickets per key
///
/// Mutations hold an upgradable lock across computing and persisting the new
/// value, so they are serialized and the file never runs behind the table.
/// Peeks keep reading the last committed table meanwhile; the write lock is
/// only taken to install a snapshot that is already on disk.
#[derive(Debug)]
pub struct Store {
    table: RwLock<CounterTable>,
    path: PathBuf,
}

impl Store {
    /// Open the store backed by `path`
    ///
    /// Missing parent directories are created. A missing file starts an empty
    /// store, an existing file must hold a valid snapshot.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_owned(),
                source,
            })?;
        }

        let table = persistence::load(&path)?;
        info!(path = %path.display(), keys = table.len(), "loaded counters");

        Ok(Self {
            table: RwLock::new(table),
            path,
        })
    }

    /// Increment the counter of `key` and return the new value
    ///
    /// The first vend of a key returns 1. The value is durably recorded before
    /// it is returned; if that fails the counter is left unchanged.
    pub fn vend(&self, key: &str) -> Result<u64> {
        let table = self.table.upgradable_read();
        let next = table
            .get(key)
            .checked_add(1)
            .ok_or_else(|| StoreError::Exhausted { key: key.to_owned() })?;
        self.commit(table, key, next)?;
        debug!(key, value = next, "vended");
        Ok(next)
    }

    /// Current value of the counter of `key`, 0 if it was never vended or set
    pub fn peek(&self, key: &str) -> u64 {
        self.table.read().get(key)
    }

    /// Overwrite the counter of `key` with `value`
    ///
    /// `value` may be smaller than the current one; later vends continue
    /// from it.
    pub fn set(&self, key: &str, value: u64) -> Result<()> {
        let table = self.table.upgradable_read();
        self.commit(table, key, value)?;
        debug!(key, value, "set");
        Ok(())
    }

    /// Number of keys with a stored value
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Whether no key has a stored value
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Copy of the current table
    pub fn snapshot(&self) -> CounterTable {
        self.table.read().clone()
    }

    /// Storage path backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `table` with `key` mapped to `value`, then install it
    ///
    /// If persisting fails, `table` is left as it was.
    fn commit(
        &self,
        table: RwLockUpgradableReadGuard<'_, CounterTable>,
        key: &str,
        value: u64,
    ) -> Result<()> {
        let mut staged = table.clone();
        staged.insert(key, value);
        persistence::save(&self.path, &staged)?;
        *RwLockUpgradableReadGuard::upgrade(table) = staged;
        Ok(())
    }
}
