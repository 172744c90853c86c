//! Termination coordination
//!
//! Waits for whichever comes first: the dispatcher reporting that input is
//! exhausted and every response is in, or the OS asking the process to stop.

use crate::dispatch::DeliverySummary;
use std::fmt;
use std::future::Future;
use tokio::signal;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Why the pipeline stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Input exhausted and all requests completed
    InputExhausted(DeliverySummary),
    /// The OS requested shutdown; in-flight requests were not awaited
    Interrupted,
    /// The dispatcher went away without reporting completion
    DispatcherExited,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::InputExhausted(summary) => {
                write!(f, "input exhausted and all requests completed ({})", summary)
            }
            TerminationReason::Interrupted => f.write_str("external interrupt"),
            TerminationReason::DispatcherExited => f.write_str("dispatcher exited unexpectedly"),
        }
    }
}

/// Block until completion or interrupt, whichever fires first.
///
/// On interrupt (and on a lost dispatcher) `stop` is cancelled so the
/// message source stops reading.
pub async fn await_either<S>(
    done: oneshot::Receiver<DeliverySummary>,
    os_signal: S,
    stop: CancellationToken,
) -> TerminationReason
where
    S: Future<Output = ()>,
{
    tokio::select! {
        biased;
        result = done => match result {
            Ok(summary) => {
                tracing::info!("Input processing is done");
                TerminationReason::InputExhausted(summary)
            }
            Err(_) => {
                tracing::error!("Dispatcher exited without signalling completion");
                stop.cancel();
                TerminationReason::DispatcherExited
            }
        },
        () = os_signal => {
            tracing::info!("Termination requested, stopping input");
            stop.cancel();
            TerminationReason::Interrupted
        }
    }
}

/// Resolves on the first SIGINT (Ctrl+C) or SIGTERM.
///
/// If a handler cannot be installed that signal source never resolves.
pub async fn os_interrupt() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
