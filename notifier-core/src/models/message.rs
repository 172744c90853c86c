//! Message model

use std::fmt;

/// A single text message to forward to the configured endpoint.
///
/// Messages carry no identity beyond their content; the body of the
/// resulting HTTP request is the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(String);

impl Message {
    /// Create a new message from any string-like value
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Consume the message and return its text
    pub fn into_body(self) -> String {
        self.0
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
