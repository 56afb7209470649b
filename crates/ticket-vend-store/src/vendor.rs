//! Request handler answering vend requests from a [`Store`]

use std::sync::Arc;

use ticket_vend_core::{Request, RequestHandler, RequestKind};
use tracing::{error, info};

use crate::store::Store;

/// Request handler backed by one shared [`Store`]
///
/// This is what the transports serve requests to.
#[derive(Debug, Clone)]
pub struct Vendor {
    store: Arc<Store>,
}

impl Vendor {
    /// Create a new [`Vendor`] serving `store`
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The store requests are answered from
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl RequestHandler for Vendor {
    fn handle(&self, mut rq: Request) {
        match rq.kind() {
            RequestKind::Vend => match self.store.vend(rq.key()) {
                Ok(ticket) => rq.respond_with_int(ticket),
                Err(e) => {
                    error!(method = %rq.method(), url = rq.url(), error = %e, "vend failed");
                    rq.respond_with_failure(e.to_string());
                }
            },
            RequestKind::Peek => {
                let value = self.store.peek(rq.key());
                rq.respond_with_int(value);
            }
            RequestKind::Set => {
                let Some(value) = rq.read_u64() else {
                    rq.respond_with_bad_request("Body must be a non-negative decimal integer!");
                    return;
                };
                match self.store.set(rq.key(), value) {
                    Ok(()) => rq.respond_with_empty(),
                    Err(e) => {
                        error!(
                            method = %rq.method(),
                            url = rq.url(),
                            value,
                            error = %e,
                            "set failed"
                        );
                        rq.respond_with_failure(e.to_string());
                    }
                }
            }
        }
    }

    fn shutdown(self) {
        info!(
            path = %self.store.path().display(),
            keys = self.store.len(),
            "vendor shut down"
        );
    }
}
