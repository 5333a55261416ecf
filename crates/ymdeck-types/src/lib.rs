//! Core types shared across all ymdeck crates.
//!
//! Defines button context ids, capabilities, player commands, state
//! snapshots, the bridge configuration and its layered loader, and the
//! configuration error type used by the connection layer, the host glue,
//! and the plugin binary.

pub mod capability;
pub mod command;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod ids;
pub mod snapshot;

pub use capability::Capability;
pub use command::PlayerCommand;
pub use config::{
    validate_port, BridgeConfig, MarqueeConfig, PollingConfig, ReconnectConfig,
    CONFIG_FILENAME, DEFAULT_DEBUG_HOST, DEFAULT_DEBUG_PORT,
};
pub use config_loader::{ConfigLoader, ConfigSource, EffectiveConfig};
pub use error::BridgeError;
pub use ids::ContextId;
pub use snapshot::{TimeReading, TimeSnapshot, TrackSnapshot};
