//! CLI command handling

pub mod handlers;
pub mod notify;
