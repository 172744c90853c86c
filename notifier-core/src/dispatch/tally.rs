//! Delivery counters reported when the pipeline finishes

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Running counts updated by the dispatcher and completion handlers
#[derive(Debug, Default)]
pub struct DeliveryTally {
    dispatched: AtomicUsize,
    delivered: AtomicUsize,
    failed: AtomicUsize,
}

impl DeliveryTally {
    pub fn record_dispatched(&self) -> usize {
        self.dispatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliverySummary {
        DeliverySummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a [`DeliveryTally`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySummary {
    pub dispatched: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} dispatched, {} delivered, {} failed",
            self.dispatched, self.delivered, self.failed
        )
    }
}
