use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type of all store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while loading or mutating the counter store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage file exists but could not be read
    #[error("failed to read counters from {}", path.display())]
    Read {
        /// Storage path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The directory holding the storage file could not be created
    #[error("failed to create storage directory {}", path.display())]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The storage file exists but does not hold a key to integer mapping
    #[error("counters in {} are malformed", path.display())]
    Corrupt {
        /// Storage path
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// A snapshot could not be written, the previous one is still in place
    #[error("failed to persist counters to {}", path.display())]
    Persist {
        /// Storage path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The counter cannot be incremented any further
    #[error("counter {key:?} is exhausted")]
    Exhausted {
        /// Counter key
        key: String,
    },
}
