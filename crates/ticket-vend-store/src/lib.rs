//! Durable ticket vending: the counter store and the request handler on top.
//!
//! The [store] keeps one counter per key in memory and snapshots the whole
//! table through the [persistence] layer on every mutation. The [vendor]
//! maps routed requests onto the store.

#![allow(rustdoc::private_intra_doc_links)]
use std::sync::Arc;

use ticket_vend_core::Config;

mod error;
mod persistence;
mod store;
mod vendor;

pub use error::{Result, StoreError};
pub use persistence::{load, save, CounterTable};
pub use store::Store;
pub use vendor::Vendor;

/// Entrypoint of the service
///
/// Opens the store at the configured storage path and wraps it in a
/// [`Vendor`] which is served requests by the surrounding infrastructure.
/// Fails if the storage file exists but cannot be loaded.
pub fn launch(config: &Config) -> Result<Vendor> {
    let store = Store::open(&config.storage_path)?;
    Ok(Vendor::new(Arc::new(store)))
}
