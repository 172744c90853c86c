//! HTTP transport for dispatched messages
//!
//! [`HttpSender`] performs a single request and is the seam for swapping the
//! real HTTP client out in tests. [`AsyncTransport`] wraps a sender with a
//! bounded worker budget and reports each outcome through a completion
//! handler.

use crate::models::HttpMethod;
use async_trait::async_trait;
use url::Url;

/// A request ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub url: Url,
    pub method: HttpMethod,
    pub body: String,
}

/// The part of an HTTP response the pipeline cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
}

impl HttpResponse {
    /// Only an exact 200 counts as delivered
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Sends one HTTP request and waits for its response
#[async_trait]
pub trait HttpSender: Send + Sync {
    /// Send a request
    async fn send(&self, request: &DispatchRequest) -> Result<HttpResponse, TransportError>;

    /// Get sender name for logging
    fn name(&self) -> &str;
}

mod async_transport;
mod error;
mod http;

pub use async_transport::AsyncTransport;
pub use error::TransportError;
pub use http::ReqwestSender;
