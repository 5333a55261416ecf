//! Error types for the ymdeck-player crate.

use thiserror::Error;
use ymdeck_browser::BrowserError;

/// Errors from running a remote query against the player page.
///
/// Executors turn these into `false` or `None` after logging them.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// No session to the player could be obtained.
    #[error("player is not reachable")]
    Unreachable,

    /// None of the query's strategies matched an element.
    #[error("element not found for {query}: {message}")]
    ElementNotFound { query: String, message: String },

    /// The script ran but reported a failure.
    #[error("{query} failed: {message}")]
    Script {
        query: String,
        message: String,
        detail: Option<String>,
    },

    /// The script returned something other than an outcome object.
    #[error("unexpected result from {query}: {detail}")]
    Decode { query: String, detail: String },

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl PlayerError {
    /// Whether this is the ordinary "control is not on screen" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PlayerError::ElementNotFound { .. })
    }
}
