//! Data models for notifier

pub mod configuration;
pub mod message;

pub use configuration::*;
pub use message::*;
