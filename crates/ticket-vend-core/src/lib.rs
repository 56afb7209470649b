//! 🏗 Infrastructure for handling vend requests, independent of the transport
#![warn(missing_docs)]

use std::path::PathBuf;

mod request;
mod route;

pub use request::{RawRequest, Request, RequestHandler, RequestKind, RequestMethod};
pub use route::{route, RouteError, VEND_PREFIX};

/// Configuration of the ticket vending service
#[derive(Clone, Debug)]
pub struct Config {
    /// File holding the durable snapshot of all counters
    pub storage_path: PathBuf,
}

impl Config {
    /// Create a configuration for the given storage path
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
        }
    }
}
