//! Bounded-parallelism request submission

use super::{DispatchRequest, HttpResponse, HttpSender, TransportError};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs requests on spawned tasks, at most `max_parallelism` at a time.
///
/// A submission waits for a free slot before its task is spawned, so a
/// saturated endpoint holds back the caller instead of piling up tasks.
pub struct AsyncTransport {
    sender: Arc<dyn HttpSender>,
    permits: Arc<Semaphore>,
    max_parallelism: usize,
}

impl AsyncTransport {
    pub fn new(sender: Arc<dyn HttpSender>, max_parallelism: usize) -> Self {
        let max_parallelism = max_parallelism.max(1);
        Self {
            sender,
            permits: Arc::new(Semaphore::new(max_parallelism)),
            max_parallelism,
        }
    }

    pub fn max_parallelism(&self) -> usize {
        self.max_parallelism
    }

    /// Submit a request once a slot is free; `handler` is invoked exactly
    /// once with its outcome.
    ///
    /// After [`close`](Self::close) the handler gets [`TransportError::Closed`]
    /// and nothing is sent.
    pub async fn submit<F>(&self, request: DispatchRequest, handler: F)
    where
        F: FnOnce(Result<HttpResponse, TransportError>) + Send + 'static,
    {
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                handler(Err(TransportError::Closed));
                return;
            }
        };

        let sender = Arc::clone(&self.sender);
        tokio::spawn(async move {
            let outcome = sender.send(&request).await;
            drop(permit);
            handler(outcome);
        });
    }

    /// Stop taking new requests. Running requests are left to finish, waiting
    /// and later submissions resolve with [`TransportError::Closed`].
    pub fn close(&self) {
        self.permits.close();
    }
}
