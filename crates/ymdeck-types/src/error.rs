//! Error types shared across ymdeck crates.

/// Errors raised while loading configuration or validating settings that
/// arrive from the plugin host.
///
/// Runtime failures against the player or the host socket have their own
/// error types in the crates that own those concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid debug port: {0}")]
    InvalidPort(String),
}
