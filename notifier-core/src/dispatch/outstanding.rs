//! Outstanding-request accounting

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counts requests that were dispatched but have not completed yet.
///
/// Increments happen on the dispatcher task through [`begin`]; decrements
/// happen wherever the returned [`InFlight`] guard is dropped, typically in a
/// completion handler on a transport task. A guard decrements exactly once,
/// so the count can never go below zero.
///
/// [`begin`]: OutstandingRequests::begin
#[derive(Debug, Default)]
pub struct OutstandingRequests {
    count: AtomicUsize,
    idle: Notify,
}

impl OutstandingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly dispatched request
    pub fn begin(self: &Arc<Self>) -> InFlight {
        self.count.fetch_add(1, Ordering::AcqRel);
        InFlight {
            owner: Arc::clone(self),
        }
    }

    /// Number of requests still awaiting completion
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Wait until every dispatched request has completed
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent last decrement is not missed
            notified.as_mut().enable();

            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn finish(&self) {
        let previous = self.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "outstanding request count underflow");
        if previous == 1 {
            self.idle.notify_waiters();
        }
    }
}

/// Guard for one outstanding request; completes the request when dropped
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the request as completed"]
pub struct InFlight {
    owner: Arc<OutstandingRequests>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.owner.finish();
    }
}
