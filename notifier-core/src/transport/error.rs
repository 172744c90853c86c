//! Transport error types

use thiserror::Error;

/// Errors surfaced to a request's completion handler
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Transport closed before the request was sent")]
    Closed,

    #[error("Connection failed: {0}")]
    Connection(String),
}
