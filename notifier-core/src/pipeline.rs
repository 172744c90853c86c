//! Pipeline wiring: source -> conduit -> dispatcher -> transport, with the
//! termination coordinator watching for completion or interrupt.

use crate::dispatch::{Dispatcher, OutstandingRequests};
use crate::models::DispatchConfig;
use crate::shutdown::{self, TerminationReason};
use crate::source::{self, MessageInput};
use crate::transport::{AsyncTransport, HttpSender};
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Capacity of the pending-message conduit
pub const CONDUIT_CAPACITY: usize = 1;

/// Run the whole pipeline until input is exhausted or `os_signal` fires.
///
/// On the interrupt path the source is stopped, requests waiting for a
/// transport slot are dropped and, when a shutdown grace period is
/// configured, in-flight requests get that long to finish.
/// Requests still outstanding after that are abandoned.
pub async fn run<S>(
    config: DispatchConfig,
    sender: Arc<dyn HttpSender>,
    input: MessageInput,
    os_signal: S,
) -> Result<TerminationReason>
where
    S: Future<Output = ()>,
{
    config.validate().context("Invalid dispatch configuration")?;
    let config = Arc::new(config);

    tracing::info!(
        url = %config.url,
        method = %config.method,
        interval = ?config.interval,
        max_in_flight = config.max_in_flight,
        sender = sender.name(),
        "Starting notifier pipeline"
    );

    let transport = Arc::new(AsyncTransport::new(sender, config.max_in_flight));
    let (message_tx, message_rx) = mpsc::channel(CONDUIT_CAPACITY);
    let (done_tx, done_rx) = oneshot::channel();
    let stop = CancellationToken::new();

    let dispatcher = Dispatcher::new(Arc::clone(&transport), Arc::clone(&config));
    let outstanding = dispatcher.outstanding();

    tokio::spawn(dispatcher.run(message_rx, done_tx));
    tokio::spawn(source::produce(message_tx, stop.clone(), input));

    let reason = shutdown::await_either(done_rx, os_signal, stop).await;

    if reason != TerminationReason::Interrupted {
        return Ok(reason);
    }

    // Requests still waiting for a slot are not sent after an interrupt
    transport.close();

    match config.shutdown_grace {
        Some(grace) => drain_outstanding(&outstanding, grace).await,
        None => {
            let abandoned = outstanding.count();
            if abandoned > 0 {
                tracing::warn!(abandoned, "Exiting without awaiting in-flight requests");
            }
        }
    }

    Ok(reason)
}

async fn drain_outstanding(outstanding: &OutstandingRequests, grace: Duration) {
    tracing::info!(
        outstanding = outstanding.count(),
        grace = ?grace,
        "Waiting for in-flight requests"
    );

    match tokio::time::timeout(grace, outstanding.wait_idle()).await {
        Ok(()) => tracing::info!("All in-flight requests completed"),
        Err(_) => tracing::warn!(
            abandoned = outstanding.count(),
            "Shutdown grace period elapsed, abandoning in-flight requests"
        ),
    }
}
