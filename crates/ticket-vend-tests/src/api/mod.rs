use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use eyre::Result;
use flume::Sender;
use thiserror::Error;
use ticket_vend_core::{RequestMethod, VEND_PREFIX};
use tokio::sync::oneshot;

pub mod mock;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Error {status}: {msg}")]
pub struct ApiError {
    pub status: u16,
    pub msg: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum Response {
    Error { status: u16, msg: String },
    Int(u64),
    Empty,
}

impl Response {
    fn into_api_response_u64(self, method: &RequestMethod) -> ApiResponse<u64> {
        match self {
            Response::Error { status, msg } => ApiResponse::error(status, msg),
            Response::Int(i) => ApiResponse::ok(i),
            resp => panic!("{method} must not be answered by {resp:?}"),
        }
    }

    fn into_api_response_empty(self, method: &RequestMethod) -> ApiResponse<()> {
        match self {
            Response::Error { status, msg } => ApiResponse::error(status, msg),
            Response::Empty => ApiResponse::ok(()),
            resp => panic!("{method} must not be answered by {resp:?}"),
        }
    }

    /// Render the response body the way a transport would
    fn into_api_response_text(self) -> ApiResponse<String> {
        match self {
            Response::Error { status, msg } => ApiResponse::error(status, msg),
            Response::Int(i) => ApiResponse::ok(i.to_string()),
            Response::Empty => ApiResponse::ok(String::new()),
        }
    }
}

struct RequestMsg {
    method: RequestMethod,
    url: String,
    body: Option<String>,
    response_channel: oneshot::Sender<Response>,
}

pub struct Api {
    /// One channel per handler thread
    channels: Arc<Vec<Sender<RequestMsg>>>,
    /// Index of the channel the next clone sends to
    next_index: Arc<AtomicUsize>,

    my_channel: Sender<RequestMsg>,
}

impl Api {
    fn new(channels: Vec<Sender<RequestMsg>>) -> Self {
        let my_channel = channels[0].clone();
        Self {
            channels: Arc::new(channels),
            next_index: Arc::new(AtomicUsize::new(1)),
            my_channel,
        }
    }
}

/// Every clone talks to the next handler thread in turn
impl Clone for Api {
    fn clone(&self) -> Self {
        let my_index = self.next_index.fetch_add(1, Ordering::Relaxed) % self.channels.len();
        Self {
            channels: self.channels.clone(),
            next_index: self.next_index.clone(),
            my_channel: self.channels[my_index].clone(),
        }
    }
}

fn vend_url(key: &str) -> String {
    format!("{VEND_PREFIX}{key}")
}

impl Api {
    async fn make_request(
        &self,
        method: RequestMethod,
        url: String,
        body: Option<String>,
    ) -> Result<Response> {
        let (sender, receiver) = oneshot::channel();
        let msg = RequestMsg {
            method,
            url,
            body,
            response_channel: sender,
        };
        self.my_channel.send_async(msg).await?;
        Ok(receiver.await?)
    }

    /// `GET /vend/{key}`: increment and return the counter
    pub async fn vend(&self, key: &str) -> Result<ApiResponse<u64>> {
        let method = RequestMethod::Get;
        let response = self.make_request(method.clone(), vend_url(key), None);
        Ok(response.await?.into_api_response_u64(&method))
    }

    /// `HEAD /vend/{key}`: return the counter
    pub async fn peek(&self, key: &str) -> Result<ApiResponse<u64>> {
        let method = RequestMethod::Head;
        let response = self.make_request(method.clone(), vend_url(key), None);
        Ok(response.await?.into_api_response_u64(&method))
    }

    /// `POST /vend/{key}`: overwrite the counter with `value`
    pub async fn set(&self, key: &str, value: u64) -> Result<ApiResponse<()>> {
        let method = RequestMethod::Post;
        let response = self.make_request(method.clone(), vend_url(key), Some(value.to_string()));
        Ok(response.await?.into_api_response_empty(&method))
    }

    /// Send an arbitrary request and get the response body as text
    pub async fn send(
        &self,
        method: RequestMethod,
        url: &str,
        body: Option<&str>,
    ) -> Result<ApiResponse<String>> {
        let response = self.make_request(method, url.to_owned(), body.map(str::to_owned));
        Ok(response.await?.into_api_response_text())
    }
}

#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub result: ApiResult<T>,
}

impl<T> ApiResponse<T> {
    fn ok(value: T) -> Self {
        Self {
            status: 200,
            result: Ok(value),
        }
    }

    fn error(status: u16, msg: String) -> Self {
        Self {
            status,
            result: Err(ApiError { status, msg }),
        }
    }

    pub fn map_response<R, F: FnOnce(T) -> Result<R>>(self, func: F) -> Result<ApiResponse<R>> {
        let result = match self.result.map(func) {
            Ok(result) => Ok(result?),
            Err(err) => Err(err),
        };
        Ok(ApiResponse {
            status: self.status,
            result,
        })
    }
}
