//! Mock API implementation directly using the `ticket-vend-store` crate

use std::sync::Arc;

use eyre::Result;
use ticket_vend_core::{route, RawRequest, Request, RequestHandler, RequestMethod};
use ticket_vend_store::Vendor;
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use tracing::debug;

use super::{Api, RequestMsg, Response};

pub struct MockVendor {
    vendor: Arc<Vendor>,
    join_handles: Vec<JoinHandle<()>>,
}

struct MockRawRequest {
    method: RequestMethod,
    url: String,
    body: Option<String>,
    response_channel: oneshot::Sender<Response>,
}

pub async fn start(threads: u16, config: ticket_vend_core::Config) -> Result<(MockVendor, Api)> {
    let vendor = Arc::new(
        tokio::task::spawn_blocking(move || ticket_vend_store::launch(&config)).await??,
    );

    let it = (0..threads).map(|_| {
        let (sender, receiver) = flume::bounded::<RequestMsg>(65536);
        let vendor = vendor.clone();
        let handle = task::spawn_blocking(move || {
            let vendor = &*vendor;
            for msg in receiver.into_iter() {
                let routed = route(&msg.method, &msg.url);
                let raw = Box::new(MockRawRequest {
                    method: msg.method,
                    url: msg.url,
                    body: msg.body,
                    response_channel: msg.response_channel,
                });
                match routed {
                    Ok((kind, key)) => vendor.handle(Request::from_raw(kind, key, raw)),
                    Err(e) => raw.respond_with_err(e.status(), e.to_string()),
                }
            }
        });
        (sender, handle)
    });
    let (senders, join_handles) = it.unzip();
    debug!(threads, "mock vendor started");

    let mock_vendor = MockVendor {
        vendor,
        join_handles,
    };
    Ok((mock_vendor, Api::new(senders)))
}

impl MockVendor {
    pub async fn shutdown(self) {
        for handle in self.join_handles {
            handle.await.unwrap()
        }
        task::spawn_blocking(move || Arc::into_inner(self.vendor).unwrap().shutdown())
            .await
            .unwrap();
    }
}

impl RawRequest for MockRawRequest {
    fn url(&self) -> &str {
        &self.url
    }

    fn method(&self) -> RequestMethod {
        self.method.clone()
    }

    fn read_string(&mut self) -> std::io::Result<String> {
        Ok(self.body.take().unwrap_or_default())
    }

    fn respond_with_err(self: Box<Self>, status: u16, msg: String) {
        let response = Response::Error { status, msg };
        self.response_channel.send(response).unwrap()
    }

    fn respond_with_int(self: Box<Self>, i: u64) {
        self.response_channel.send(Response::Int(i)).unwrap()
    }

    fn respond_with_empty(self: Box<Self>) {
        self.response_channel.send(Response::Empty).unwrap()
    }
}
