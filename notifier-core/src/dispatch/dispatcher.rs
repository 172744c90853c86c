//! The dispatcher: conduit consumer, request builder and pacer

use super::{DeliverySummary, DeliveryTally, OutstandingRequests};
use crate::models::{DispatchConfig, Message};
use crate::transport::{AsyncTransport, DispatchRequest, HttpResponse, TransportError};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Consumes messages one at a time and submits one request per message.
///
/// Pacing is measured from dispatch time: after each submission the
/// dispatcher sleeps for the configured interval, regardless of how long the
/// request takes. The concurrency cap is enforced by the transport: while it
/// is saturated the dispatcher stops receiving, which in turn blocks the
/// source on the conduit.
pub struct Dispatcher {
    transport: Arc<AsyncTransport>,
    config: Arc<DispatchConfig>,
    outstanding: Arc<OutstandingRequests>,
    tally: Arc<DeliveryTally>,
}

impl Dispatcher {
    pub fn new(transport: Arc<AsyncTransport>, config: Arc<DispatchConfig>) -> Self {
        Self {
            transport,
            config,
            outstanding: Arc::new(OutstandingRequests::new()),
            tally: Arc::new(DeliveryTally::default()),
        }
    }

    /// Shared handle to the outstanding-request counter
    pub fn outstanding(&self) -> Arc<OutstandingRequests> {
        Arc::clone(&self.outstanding)
    }

    /// Run until the conduit is closed and every request has completed,
    /// then send the summary on `done`.
    pub async fn run(
        self,
        mut source: mpsc::Receiver<Message>,
        done: oneshot::Sender<DeliverySummary>,
    ) {
        while let Some(message) = source.recv().await {
            self.dispatch(message).await;

            if !self.config.interval.is_zero() {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        tracing::info!("Pending message conduit has been closed");
        self.outstanding.wait_idle().await;

        let summary = self.tally.snapshot();
        tracing::info!(
            dispatched = summary.dispatched,
            delivered = summary.delivered,
            failed = summary.failed,
            "Responses for all pending messages have been received"
        );

        if done.send(summary).is_err() {
            tracing::debug!("Completion signal dropped, coordinator already finished");
        }
    }

    async fn dispatch(&self, message: Message) {
        let in_flight = self.outstanding.begin();
        let seq = self.tally.record_dispatched();

        let request = DispatchRequest {
            url: self.config.url.clone(),
            method: self.config.method,
            body: message.into_body(),
        };
        tracing::debug!(seq, bytes = request.body.len(), "Received pending message");

        let tally = Arc::clone(&self.tally);
        self.transport
            .submit(request, move |outcome| {
                record_outcome(&tally, seq, outcome);
                // Completion is recorded before the request stops counting as outstanding
                drop(in_flight);
            })
            .await;

        tracing::info!(
            seq,
            method = %self.config.method,
            url = %self.config.url,
            "Dispatched pending message"
        );
    }
}

fn record_outcome(
    tally: &DeliveryTally,
    seq: usize,
    outcome: Result<HttpResponse, TransportError>,
) {
    match outcome {
        Ok(response) if response.is_success() => {
            tally.record_delivered();
            tracing::info!(
                seq,
                status = response.status,
                "Received success response for request"
            );
        }
        Ok(response) => {
            tally.record_failed();
            tracing::warn!(seq, status = response.status, "Request failed with status code");
        }
        Err(e) => {
            tally.record_failed();
            tracing::warn!(seq, error = %e, "Request failed because of error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpSender;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::Instant;

    /// Mock sender that records every request with the time it was sent
    struct RecordingSender {
        sent: Mutex<Vec<(Instant, String)>>,
        status_for: fn(&str) -> Result<u16, String>,
        delay: Duration,
    }

    impl RecordingSender {
        fn new(status_for: fn(&str) -> Result<u16, String>) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                status_for,
                delay: Duration::ZERO,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                status_for: |_| Ok(200),
                delay,
            })
        }

        async fn bodies(&self) -> Vec<String> {
            self.sent.lock().await.iter().map(|(_, b)| b.clone()).collect()
        }
    }

    #[async_trait]
    impl HttpSender for RecordingSender {
        async fn send(&self, request: &DispatchRequest) -> Result<HttpResponse, TransportError> {
            self.sent
                .lock()
                .await
                .push((Instant::now(), request.body.clone()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            (self.status_for)(&request.body)
                .map(|status| HttpResponse { status })
                .map_err(TransportError::Connection)
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn dispatcher(sender: Arc<RecordingSender>, interval: Duration, max: usize) -> Dispatcher {
        let config = DispatchConfig::new("http://localhost:9/notify", interval)
            .unwrap()
            .with_max_in_flight(max);
        let transport = Arc::new(AsyncTransport::new(sender, max));
        Dispatcher::new(transport, Arc::new(config))
    }

    async fn feed(messages: &[&str]) -> mpsc::Receiver<Message> {
        let (tx, rx) = mpsc::channel(messages.len().max(1));
        for m in messages {
            tx.send(Message::from(*m)).await.unwrap();
        }
        rx
    }

    #[tokio::test]
    async fn test_one_request_per_message_in_order() {
        let sender = RecordingSender::new(|_| Ok(200));
        let (done_tx, done_rx) = oneshot::channel();

        dispatcher(sender.clone(), Duration::ZERO, 1)
            .run(feed(&["a", "b", "c"]).await, done_tx)
            .await;

        let summary = done_rx.await.unwrap();
        assert_eq!(sender.bodies().await, vec!["a", "b", "c"]);
        assert_eq!(
            summary,
            DeliverySummary {
                dispatched: 3,
                delivered: 3,
                failed: 0,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_are_paced_by_interval() {
        let sender = RecordingSender::new(|_| Ok(200));
        let (done_tx, done_rx) = oneshot::channel();
        let interval = Duration::from_millis(250);

        dispatcher(sender.clone(), interval, 3)
            .run(feed(&["1", "2", "3", "4"]).await, done_tx)
            .await;
        done_rx.await.unwrap();

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 4);
        for pair in sent.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= interval);
        }
    }

    #[tokio::test]
    async fn test_failures_are_resolved_not_retried() {
        let sender = RecordingSender::new(|body| match body {
            "refused" => Err("connection refused".to_string()),
            "missing" => Ok(404),
            "created" => Ok(201),
            _ => Ok(200),
        });
        let (done_tx, done_rx) = oneshot::channel();

        dispatcher(sender.clone(), Duration::ZERO, 3)
            .run(feed(&["ok", "refused", "missing", "created"]).await, done_tx)
            .await;

        let summary = done_rx.await.unwrap();
        assert_eq!(sender.bodies().await.len(), 4);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 3);
    }

    #[tokio::test]
    async fn test_completion_waits_for_outstanding_requests() {
        let sender = RecordingSender::slow(Duration::from_millis(100));
        let (done_tx, done_rx) = oneshot::channel();
        let d = dispatcher(sender, Duration::ZERO, 3);
        let outstanding = d.outstanding();

        let started = std::time::Instant::now();
        d.run(feed(&["x", "y"]).await, done_tx).await;

        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(outstanding.count(), 0);
        assert_eq!(done_rx.await.unwrap().delivered, 2);
    }

    #[tokio::test]
    async fn test_saturated_transport_stops_receiving() {
        let sender = RecordingSender::slow(Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel(1);
        let (done_tx, _done_rx) = oneshot::channel();
        let d = dispatcher(sender.clone(), Duration::ZERO, 1);
        let outstanding = d.outstanding();
        let handle = tokio::spawn(d.run(rx, done_tx));

        tx.send(Message::from("running")).await.unwrap();
        tx.send(Message::from("waiting")).await.unwrap();
        // The conduit slot is free again only once "waiting" has been received
        tx.send(Message::from("buffered")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(tx.try_send(Message::from("blocked")).is_err());
        assert_eq!(sender.bodies().await, vec!["running"]);
        assert_eq!(outstanding.count(), 2);
        handle.abort();
    }

    #[tokio::test]
    async fn test_no_completion_while_conduit_open() {
        let sender = RecordingSender::new(|_| Ok(200));
        let (tx, rx) = mpsc::channel(1);
        let (done_tx, mut done_rx) = oneshot::channel();
        let d = dispatcher(sender, Duration::ZERO, 3);
        let outstanding = d.outstanding();
        let handle = tokio::spawn(d.run(rx, done_tx));

        tx.send(Message::from("only")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(outstanding.count(), 0);
        assert!(done_rx.try_recv().is_err());

        drop(tx);
        handle.await.unwrap();
        assert_eq!(done_rx.await.unwrap().dispatched, 1);
    }
}
