//! Error types for the ymdeck-host crate.

use thiserror::Error;

/// Errors from the plugin host connection and its message framing.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host's WebSocket could not be opened.
    #[error("failed to connect to plugin host at {url}: {reason}")]
    Connect { url: String, reason: String },

    /// An inbound frame was not a valid host event.
    #[error("malformed host message: {detail}")]
    MalformedMessage { detail: String },

    /// The launch arguments were incomplete or inconsistent.
    #[error("invalid launch arguments: {0}")]
    InvalidArgs(String),

    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}
