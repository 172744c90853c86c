//! reqwest-backed sender

use super::{DispatchRequest, HttpResponse, HttpSender, TransportError};
use crate::models::HttpMethod;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::time::Duration;

/// Sends requests with a shared [`reqwest::Client`] (pooled connections)
pub struct ReqwestSender {
    client: Client,
}

impl ReqwestSender {
    /// Create a sender; `request_timeout` bounds each whole request
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::ClientBuild)?;
        Ok(Self { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: &DispatchRequest) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .request(to_reqwest_method(request.method), request.url.clone())
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(request.body.clone())
            .send()
            .await?;

        Ok(HttpResponse {
            status: response.status().as_u16(),
        })
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
