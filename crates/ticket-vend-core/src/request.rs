use std::fmt;
use std::io;

/// Kind of the request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum RequestKind {
    /// Increment the key's counter and respond with the new value
    ///
    /// Sent as `GET /vend/{key}`.
    Vend,

    /// Respond with the key's current value without changing it
    ///
    /// Sent as `HEAD /vend/{key}`.
    Peek,

    /// Overwrite the key's counter with the decimal integer in the body
    ///
    /// Sent as `POST /vend/{key}`. The response body is empty.
    Set,
}

/// HTTP request method
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RequestMethod {
    /// GET request
    Get,
    /// HEAD request
    Head,
    /// POST request, may have a payload
    Post,
    /// Any other method, carried verbatim for error reporting
    Other(String),
}

impl RequestMethod {
    /// Map a method name to a [`RequestMethod`]
    pub fn from_name(name: &str) -> Self {
        match name {
            "GET" => RequestMethod::Get,
            "HEAD" => RequestMethod::Head,
            "POST" => RequestMethod::Post,
            other => RequestMethod::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Get => f.write_str("GET"),
            RequestMethod::Head => f.write_str("HEAD"),
            RequestMethod::Post => f.write_str("POST"),
            RequestMethod::Other(name) => f.write_str(name),
        }
    }
}

/// A routed request for one counter key
pub struct Request {
    kind: RequestKind,
    key: String,
    raw: Box<dyn RawRequest + Send>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// Interface for answering vend requests
pub trait RequestHandler {
    /// Handle a routed request
    ///
    /// This method may be called concurrently from different threads.
    fn handle(&self, request: Request);

    /// Shut the handler down
    fn shutdown(self);
}

/// A raw request, implemented by each transport
pub trait RawRequest {
    /// Get the URL
    fn url(&self) -> &str;
    /// Get the request method
    fn method(&self) -> RequestMethod;

    /// Read the request body as string
    fn read_string(&mut self) -> io::Result<String>;

    /// Respond with an error status and message
    fn respond_with_err(self: Box<Self>, status: u16, err: String);
    /// Respond with a decimal integer and status 200
    fn respond_with_int(self: Box<Self>, int: u64);
    /// Respond with an empty body and status 200
    fn respond_with_empty(self: Box<Self>);
}

impl Request {
    /// Get the request's kind
    #[inline]
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Get the counter key the request refers to
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the request URL
    #[inline]
    pub fn url(&self) -> &str {
        self.raw.url()
    }

    /// Get the request method
    #[inline]
    pub fn method(&self) -> RequestMethod {
        self.raw.method()
    }

    /// Read a non-negative decimal integer from the request body
    ///
    /// Surrounding ASCII whitespace is ignored. In case the body is not such
    /// an integer (or some communication error happened), [`None`] is
    /// returned.
    ///
    /// This method has side effects and should be called only once per
    /// request.
    pub fn read_u64(&mut self) -> Option<u64> {
        let body = self.raw.read_string().ok()?;
        let digits = body.trim_matches(|c: char| c.is_ascii_whitespace());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Respond with 400 to a request the client got wrong
    #[inline]
    pub fn respond_with_bad_request(self, err: impl Into<String>) {
        self.raw.respond_with_err(400, err.into());
    }

    /// Respond with 500 to a request the service failed to carry out
    #[inline]
    pub fn respond_with_failure(self, err: impl Into<String>) {
        self.raw.respond_with_err(500, err.into());
    }

    /// Respond with a counter value
    #[inline]
    pub fn respond_with_int(self, int: u64) {
        self.raw.respond_with_int(int);
    }

    /// Respond with an empty body
    #[inline]
    pub fn respond_with_empty(self) {
        self.raw.respond_with_empty();
    }

    /// Create a new request from a [`RawRequest`] already routed by
    /// [`crate::route()`]
    #[inline]
    pub fn from_raw(kind: RequestKind, key: String, raw: Box<dyn RawRequest + Send>) -> Self {
        Self { kind, key, raw }
    }
}
