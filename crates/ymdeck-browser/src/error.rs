//! Error types for the ymdeck-browser crate.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to the player's debugging endpoint.
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    /// Nothing is listening on the debugging port.
    #[error("connection refused on debug port {port}")]
    ConnectionRefused { port: u16 },

    /// Failed to establish a WebSocket connection to the page target.
    #[error("failed to connect to DevTools at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The endpoint answered but exposed no page target.
    #[error("no page target with a debugger URL on port {port}")]
    NoPageTarget { port: u16 },

    /// A CDP command returned an error response.
    #[error("CDP error {code}: {message}")]
    CdpError {
        code: i64,
        message: String,
        data: Option<String>,
    },

    /// A CDP command timed out waiting for a response.
    #[error("CDP command '{method}' timed out after {duration:?}")]
    Timeout { method: String, duration: Duration },

    /// A protocol-level error (serialization, unexpected message format, etc.).
    #[error("CDP protocol error: {detail}")]
    Protocol { detail: String },

    /// JavaScript evaluation returned an exception.
    #[error("JavaScript exception: {message}")]
    JsException { message: String },
}

impl BrowserError {
    /// Whether this error means the player is not running with debugging on.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, BrowserError::ConnectionRefused { .. })
    }
}

/// Whether `err` or anything in its source chain is an I/O "connection
/// refused". DNS and TLS failures do not count.
pub(crate) fn refused_by_peer(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = e.source();
    }
    false
}
