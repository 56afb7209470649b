//! 🏗 HTTP request implementation

use std::io;
use std::io::Read;
use std::mem;

use ticket_vend_core::{route, RawRequest, Request, RequestMethod, RouteError};
use tiny_http::Response;
use tracing::{debug, warn};

const USAGE: &str = "🦀 could not find the counter you are looking for!

Valid requests are:
  GET  /vend/<key>   increment and return the counter
  HEAD /vend/<key>   return the counter
  POST /vend/<key>   overwrite the counter with the decimal body";

/// Longest body an overwrite is read from: a `u64` in decimal plus whitespace
const MAX_BODY_LENGTH: usize = 64;

/// Longest declared body tiny_http may be left to discard
///
/// On drop, tiny_http reads the unread rest of a body into a single buffer of
/// the remaining declared length.
const MAX_DISCARDED_LENGTH: usize = 1 << 20;

struct HTTPRequest(tiny_http::Request);

impl RawRequest for HTTPRequest {
    fn url(&self) -> &str {
        self.0.url()
    }

    fn method(&self) -> RequestMethod {
        RequestMethod::from_name(self.0.method().as_str())
    }

    fn read_string(&mut self) -> io::Result<String> {
        let capacity = self.0.body_length().unwrap_or(16).min(MAX_BODY_LENGTH);
        let mut s = String::with_capacity(capacity);
        self.0
            .as_reader()
            .take(MAX_BODY_LENGTH as u64 + 1)
            .read_to_string(&mut s)?;
        if s.len() > MAX_BODY_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request body too long",
            ));
        }
        Ok(s)
    }

    fn respond_with_err(self: Box<Self>, status: u16, err: String) {
        respond(self.0, Response::from_string(err).with_status_code(status))
    }

    fn respond_with_int(self: Box<Self>, int: u64) {
        respond(
            self.0,
            Response::from_string(int.to_string()).with_status_code(200),
        )
    }

    fn respond_with_empty(self: Box<Self>) {
        respond(self.0, Response::empty(200))
    }
}

/// Send `res`
///
/// The operation behind the response has completed at this point, a client
/// that went away only loses the answer.
fn respond<R: Read>(rq: tiny_http::Request, res: Response<R>) {
    let (method, url) = (rq.method().clone(), rq.url().to_owned());
    if let Err(e) = rq.respond(res) {
        warn!(%method, url = url.as_str(), error = %e, "HTTP response failed");
    }
}

/// Parse the given HTTP request
///
/// If [`None`] is returned, the request was already answered with a
/// corresponding error message. Requests declaring a body too large to ever be
/// discarded are not answered and their connection is abandoned.
pub fn parse(rq: tiny_http::Request) -> Option<Request> {
    if let Some(len) = rq.body_length().filter(|&len| len > MAX_DISCARDED_LENGTH) {
        warn!(
            method = %rq.method(),
            url = rq.url(),
            len,
            "abandoning request with oversized body"
        );
        // Dropping it would allocate the declared length
        mem::forget(rq);
        return None;
    }

    let method = RequestMethod::from_name(rq.method().as_str());
    match route(&method, rq.url()) {
        Ok((kind, key)) => Some(Request::from_raw(kind, key, Box::new(HTTPRequest(rq)))),
        Err(e) => {
            debug!(error = %e, "unroutable request");
            let msg = match e {
                RouteError::NotFound(_) => USAGE.to_owned(),
                RouteError::MethodNotAllowed(_) => e.to_string(),
            };
            respond(rq, Response::from_string(msg).with_status_code(e.status()));
            None
        }
    }
}
