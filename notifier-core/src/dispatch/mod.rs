//! Rate-limited dispatch of messages to the transport

mod dispatcher;
mod outstanding;
mod tally;

pub use dispatcher::Dispatcher;
pub use outstanding::{InFlight, OutstandingRequests};
pub use tally::{DeliverySummary, DeliveryTally};
