use std::path::{Path, PathBuf};

use eyre::Result;
use tempfile::TempDir;

mod api;
pub use api::{Api, ApiError, ApiResponse, ApiResult};

/// Name of the storage file inside a scratch directory
const STORAGE_FILE: &str = "counters.json";

pub struct TestCtxBuilder {
    /// Count of handler threads
    pub handler_threads: u16,
    /// Storage path, a fresh scratch directory is used if unset
    pub storage_path: Option<PathBuf>,
}

impl Default for TestCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCtxBuilder {
    /// Create a new test context builder with two handler threads and a fresh
    /// storage path
    pub fn new() -> Self {
        TestCtxBuilder {
            handler_threads: 2,
            storage_path: None,
        }
    }

    /// Set the number of handler threads to use
    pub fn with_handler_threads(mut self, threads: u16) -> Self {
        assert_ne!(threads, 0);
        self.handler_threads = threads;
        self
    }

    /// Serve from the given storage path instead of a scratch directory
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Build the test context
    ///
    /// Fails like the service does at startup, e.g. on a malformed storage
    /// file.
    pub async fn build(mut self) -> Result<TestCtx> {
        let (storage_path, scratch) = match self.storage_path.take() {
            Some(path) => (path, None),
            None => {
                let dir = tempfile::tempdir()?;
                (dir.path().join(STORAGE_FILE), Some(dir))
            }
        };
        self.launch(storage_path, scratch).await
    }

    async fn launch(&self, storage_path: PathBuf, scratch: Option<TempDir>) -> Result<TestCtx> {
        let config = ticket_vend_core::Config::new(&storage_path);
        let (vendor, api) = api::mock::start(self.handler_threads, config).await?;

        Ok(TestCtx {
            api,
            vendor,
            handler_threads: self.handler_threads,
            storage_path,
            scratch,
            drop_bomb: DropBomb,
        })
    }
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the vending service
    pub api: Api,
    vendor: api::mock::MockVendor,
    /// Number of handler threads
    pub handler_threads: u16,
    storage_path: PathBuf,
    scratch: Option<TempDir>,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// Storage path the service is serving from
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Shut the service down and start a new one on the same storage path,
    /// like a process restart
    pub async fn reopen(self) -> Result<TestCtx> {
        let threads = self.handler_threads;
        let (storage_path, scratch) = self.shut_down().await;
        TestCtxBuilder::new()
            .with_handler_threads(threads)
            .launch(storage_path, scratch)
            .await
    }

    /// Shut the service down and finish the test
    pub async fn finish(self) {
        self.shut_down().await;
    }

    async fn shut_down(self) -> (PathBuf, Option<TempDir>) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        self.vendor.shutdown().await;
        (self.storage_path, self.scratch)
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the vending service down");
    }
}
