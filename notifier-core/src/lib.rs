//! # Notifier Core Library
//!
//! Forwards a stream of text messages to a single HTTP endpoint at a minimum
//! interval, with a bounded number of requests in flight.
//!
//! The pipeline has three tasks: the message [`source`] publishes into a
//! one-slot conduit, the [`dispatch`] loop turns each message into a request
//! and paces submissions, and the [`shutdown`] coordinator reconciles
//! "all input delivered" with an external interrupt. [`pipeline::run`] wires
//! them together.

pub mod dispatch;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod shutdown;
pub mod source;
pub mod transport;
